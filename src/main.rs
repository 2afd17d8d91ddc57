use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use shredder::config::NEGATIVE_TIMEOUT_WARNING;
use shredder::io_adapters::{RawStdout, write_all};
use shredder::{Config, Interpreter, signals};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Minimal shell: runs each line as a single program and waits for it.
struct Args {
    #[argh(positional, greedy)]
    /// seconds a command may run before it is killed; 0 or nothing disables
    /// the limit.
    timeout: Vec<String>,
}

impl Args {
    /// Parse the arguments that follow the program name.
    ///
    /// Everything the user typed is a value, never a flag: `-5`, `-x` or
    /// `help` all reach the timeout conversion untouched.
    fn parse(cmd: &str, raw: &[String]) -> Self {
        let mut strs: Vec<&str> = Vec::with_capacity(raw.len() + 1);
        strs.push("--");
        strs.extend(raw.iter().map(|s| s.as_str()));
        match Args::from_args(&[cmd], &strs) {
            Ok(args) => args,
            // Never refuse to start over the arguments.
            Err(EarlyExit { .. }) => Args {
                timeout: raw.to_vec(),
            },
        }
    }

    fn from_env() -> Self {
        let mut strings: Vec<String> = std::env::args().collect();
        let cmd = if strings.is_empty() {
            "shredder".to_string()
        } else {
            strings.remove(0)
        };
        Args::parse(&cmd, &strings)
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("SHREDDER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::from_env();

    signals::install()?;

    let parsed = Config::from_args(args.timeout.as_slice());
    if parsed.rejected_negative {
        warn!(argument = ?args.timeout, "negative timeout ignored");
        write_all(&mut RawStdout, NEGATIVE_TIMEOUT_WARNING.as_bytes())?;
    }

    Interpreter::new(parsed.config).repl()?;
    Ok(())
}
