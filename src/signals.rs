//! Asynchronous termination of the running child.
//!
//! Two handlers are installed: `SIGINT` kills the child (never the shell), and
//! `SIGALRM` (the timeout) kills the child and prints the catchphrase. Both
//! run with the main loop suspended at an arbitrary point, so their bodies
//! are restricted to an atomic load, `kill(2)`, `write(2)` and `_exit(2)`.

use crate::error::{Result, ShellError};
use crate::external::{CURRENT_CHILD, force_terminate};
use crate::io_adapters::{signal_safe_stderr, signal_safe_stdout};
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

/// Printed once each time the timeout kills a command.
pub const CATCHPHRASE: &str = "Bwahaha ... tonight I dine on turtle soup\n";

/// Install the interrupt and timeout handlers for this process.
pub fn install() -> Result<()> {
    register(Signal::SIGINT, on_interrupt)?;
    register(Signal::SIGALRM, on_timeout)?;
    Ok(())
}

fn register(sig: Signal, handler: extern "C" fn(libc::c_int)) -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(handler),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: both handlers only use async-signal-safe operations.
    unsafe { sigaction(sig, &action) }.map_err(ShellError::Signal)?;
    Ok(())
}

/// Restores the interrupted code's `errno` when the handler returns.
struct SavedErrno(i32);

impl SavedErrno {
    fn save() -> Self {
        Self(Errno::last_raw())
    }
}

impl Drop for SavedErrno {
    fn drop(&mut self) {
        Errno::set_raw(self.0);
    }
}

extern "C" fn on_interrupt(_sig: libc::c_int) {
    let _errno = SavedErrno::save();
    kill_current_child();
}

extern "C" fn on_timeout(_sig: libc::c_int) {
    let _errno = SavedErrno::save();
    // The command may have finished on its own just before the deadline.
    if kill_current_child() && !signal_safe_stdout(CATCHPHRASE.as_bytes()) {
        die(b"Error in write: ", Errno::last());
    }
}

fn kill_current_child() -> bool {
    match force_terminate(&CURRENT_CHILD) {
        Ok(killed) => killed,
        Err(ShellError::Kill(errno)) => die(b"Error in kill: ", errno),
        Err(_) => false,
    }
}

fn die(operation: &[u8], errno: Errno) -> ! {
    signal_safe_stderr(operation);
    signal_safe_stderr(errno.desc().as_bytes());
    signal_safe_stderr(b"\n");
    // SAFETY: terminating from inside a handler; nothing may unwind from here.
    unsafe { libc::_exit(libc::EXIT_FAILURE) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catchphrase_is_a_single_line() {
        assert!(CATCHPHRASE.ends_with('\n'));
        assert_eq!(CATCHPHRASE.matches('\n').count(), 1);
    }

    #[test]
    fn handler_leaves_errno_untouched() {
        Errno::set_raw(Errno::EAGAIN as i32);
        on_interrupt(libc::SIGINT);
        on_timeout(libc::SIGALRM);
        assert_eq!(Errno::last(), Errno::EAGAIN);

        {
            let _errno = SavedErrno::save();
            Errno::set_raw(Errno::EBADF as i32);
        }
        assert_eq!(Errno::last(), Errno::EAGAIN);
    }

    #[test]
    fn handlers_install() {
        install().unwrap();
        // Idle shell: an interrupt must not take the process down.
        nix::sys::signal::raise(Signal::SIGINT).unwrap();
    }
}
