use nix::errno::Errno;
use thiserror::Error;

/// Unrecoverable failures of the shell itself.
///
/// Every variant names the system operation that failed and carries the
/// reported errno. None of them are retried: the caller is expected to print
/// the diagnostic and end the whole program with a failure status.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellError {
    #[error("Error in read: {0}")]
    Read(Errno),

    #[error("Error in write: {0}")]
    Write(Errno),

    #[error("Error in creating child process: {0}")]
    Fork(Errno),

    #[error("Error in child process termination: {0}")]
    Wait(Errno),

    #[error("Error in kill: {0}")]
    Kill(Errno),

    #[error("Error in signal: {0}")]
    Signal(Errno),
}

pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_names_the_failed_operation() {
        let msg = ShellError::Fork(Errno::EAGAIN).to_string();
        assert!(msg.starts_with("Error in creating child process: "), "{msg}");

        let msg = ShellError::Kill(Errno::EPERM).to_string();
        assert!(msg.starts_with("Error in kill: "), "{msg}");
    }
}
