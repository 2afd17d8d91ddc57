use crate::command::CommandLine;
use crate::error::{Result, ShellError};
use crate::io_adapters::signal_safe_stderr;
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execve, fork};
use std::ffi::CStr;
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::{debug, trace};

const NO_CHILD: i32 = 0;

/// Slot holding the pid of the running child, or nothing.
///
/// This is the only state shared between the main loop and the signal
/// handlers. It is published right after `fork` returns in the parent and
/// cleared only after the child has been reaped, so a handler that sees a pid
/// always sees a process that is alive or a zombie owned by this shell.
#[derive(Debug)]
pub struct ChildSlot(AtomicI32);

impl ChildSlot {
    pub const fn new() -> Self {
        Self(AtomicI32::new(NO_CHILD))
    }

    pub fn current(&self) -> Option<Pid> {
        match self.0.load(Ordering::SeqCst) {
            NO_CHILD => None,
            raw => Some(Pid::from_raw(raw)),
        }
    }

    fn publish(&self, pid: Pid) {
        self.0.store(pid.as_raw(), Ordering::SeqCst);
    }

    fn clear(&self) {
        self.0.store(NO_CHILD, Ordering::SeqCst);
    }
}

/// The slot consulted by the process-wide signal handlers.
pub static CURRENT_CHILD: ChildSlot = ChildSlot::new();

/// How a reaped child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    Exited(i32),
    Signaled(Signal),
}

impl TerminationStatus {
    /// Shell-style exit code: the exit status, or `128 + signal`.
    pub fn code(&self) -> i32 {
        match self {
            TerminationStatus::Exited(code) => *code,
            TerminationStatus::Signaled(sig) => 128 + *sig as i32,
        }
    }
}

/// Owns the lifecycle of at most one child process at a time.
#[derive(Debug, Clone, Copy)]
pub struct ProcessController {
    slot: &'static ChildSlot,
}

impl ProcessController {
    pub fn new(slot: &'static ChildSlot) -> Self {
        Self { slot }
    }

    /// Fork and exec `command` with `argv = [command]` and an empty environment.
    ///
    /// The child never returns into shell code: if `execve` fails it reports
    /// the error and leaves with `_exit`. In the parent, the new pid is
    /// published into the slot before this returns.
    pub fn spawn(&self, command: &CommandLine) -> Result<Pid> {
        // Everything the child needs is prepared before fork.
        let path = command.as_c_str();
        let argv: [&CStr; 1] = [path];
        let envp: [&CStr; 0] = [];

        // SAFETY: the shell is single-threaded, and the child only calls
        // execve, write and _exit before its image is replaced.
        match unsafe { fork() }.map_err(ShellError::Fork)? {
            ForkResult::Child => {
                let err = match execve(path, &argv[..], &envp[..]) {
                    Err(err) => err,
                    Ok(never) => match never {},
                };
                exec_failed(err)
            }
            ForkResult::Parent { child } => {
                self.slot.publish(child);
                debug!(pid = child.as_raw(), command = %command, "spawned child");
                Ok(child)
            }
        }
    }

    /// Block until `child` is reaped.
    ///
    /// Stopped and continued notifications are not terminations and are
    /// waited through, as is `EINTR`. The slot is cleared once the child is
    /// gone.
    pub fn await_termination(&self, child: Pid) -> Result<TerminationStatus> {
        let status = loop {
            match waitpid(child, None) {
                Ok(WaitStatus::Exited(_, code)) => break TerminationStatus::Exited(code),
                Ok(WaitStatus::Signaled(_, sig, _)) => break TerminationStatus::Signaled(sig),
                Ok(other) => {
                    trace!(?other, "child has not terminated yet");
                    continue;
                }
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(ShellError::Wait(errno)),
            }
        };
        self.slot.clear();
        debug!(pid = child.as_raw(), ?status, "reaped child");
        Ok(status)
    }

    /// Send `SIGKILL` to the child in the slot, if any.
    ///
    /// Does not wait for the child. Safe to call at any time, including from a
    /// signal handler.
    pub fn force_terminate(&self) -> Result<bool> {
        force_terminate(self.slot)
    }
}

/// Kill whatever the slot currently holds.
///
/// Returns whether a kill was issued. `ESRCH` means the child was reaped just
/// before the slot was cleared, so it counts as nothing to kill.
///
/// Async-signal-safe: one atomic load and one `kill(2)`.
pub(crate) fn force_terminate(slot: &ChildSlot) -> Result<bool> {
    let Some(pid) = slot.current() else {
        return Ok(false);
    };
    match signal::kill(pid, Signal::SIGKILL) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(errno) => Err(ShellError::Kill(errno)),
    }
}

fn exec_failed(err: Errno) -> ! {
    signal_safe_stderr(b"Error in execve: ");
    signal_safe_stderr(err.desc().as_bytes());
    signal_safe_stderr(b"\n");
    // SAFETY: leave the forked child without running the parent's exit hooks.
    unsafe { libc::_exit(libc::EXIT_FAILURE) }
}
