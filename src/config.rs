use crate::timer::Timeout;

/// Printed when the timeout argument is negative.
pub const NEGATIVE_TIMEOUT_WARNING: &str = "Invalid input detected. Ignoring timeout value.\n";

/// Startup settings. Fixed for the lifetime of the shell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub timeout: Timeout,
}

/// Result of interpreting the command line arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parsed {
    pub config: Config,
    /// Set when the user asked for something that was ignored and should be
    /// warned about.
    pub rejected_negative: bool,
}

impl Config {
    /// Interpret the positional arguments given to the shell.
    ///
    /// Only a single argument is looked at. It is converted the way C `atoi`
    /// does it, so garbage quietly becomes zero; a negative value is rejected
    /// and the timeout stays disabled.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Parsed {
        let value = match args {
            [only] => atoi(only.as_ref()),
            _ => 0,
        };
        if value < 0 {
            return Parsed {
                config: Config::default(),
                rejected_negative: true,
            };
        }
        let secs = u32::try_from(value).unwrap_or(u32::MAX);
        Parsed {
            config: Config {
                timeout: Timeout::from_secs(secs),
            },
            rejected_negative: false,
        }
    }
}

/// Leading whitespace, optional sign, then as many decimal digits as there
/// are. Saturates instead of overflowing.
fn atoi(text: &str) -> i64 {
    let bytes = text.trim_start().as_bytes();
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    let mut value: i64 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}
