use nix::unistd::alarm;
use std::fmt;
use tracing::trace;

/// Per-command deadline in whole seconds. Zero disables it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timeout(u32);

impl Timeout {
    pub const DISABLED: Timeout = Timeout(0);

    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u32 {
        self.0
    }

    pub const fn is_enabled(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_enabled() {
            write!(f, "{}s", self.0)
        } else {
            f.write_str("disabled")
        }
    }
}

/// One-shot deadline backed by `alarm(2)`.
///
/// Expiry raises `SIGALRM`; what happens then is up to the handler installed
/// by [`crate::signals::install`].
#[derive(Debug, Clone, Copy)]
pub struct TimeoutTimer {
    timeout: Timeout,
}

impl TimeoutTimer {
    pub fn new(timeout: Timeout) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Schedule the deadline. Does nothing when the timeout is disabled.
    pub fn arm(&self) {
        if self.timeout.is_enabled() {
            trace!(timeout = %self.timeout, "arming timer");
            alarm::set(self.timeout.as_secs());
        }
    }

    /// Cancel a pending deadline, if there is one.
    pub fn disarm(&self) {
        if self.timeout.is_enabled() {
            if let Some(left) = alarm::cancel() {
                trace!(left, "disarmed timer");
            }
        }
    }
}
