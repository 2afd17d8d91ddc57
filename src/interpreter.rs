use crate::command::{CommandLine, LineReader, ReadOutcome};
use crate::config::Config;
use crate::error::Result;
use crate::external::{CURRENT_CHILD, ChildSlot, ProcessController, TerminationStatus};
use crate::io_adapters::{RawStdin, RawStdout, write_all};
use crate::timer::TimeoutTimer;
use std::io::{Read, Write};
use tracing::{debug, trace};

/// Written before every read.
pub const PROMPT: &str = "penn-shredder# ";

/// What one pass through the loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// Whitespace only; nothing was launched.
    Idle,
    /// A command ran and was reaped.
    Ran(TerminationStatus),
    /// Input is closed. The shell should exit successfully.
    EndOfInput,
}

/// The read-execute-wait loop.
///
/// Each pass prompts, reads one command with a single bounded read, runs it
/// as one child process under the optional timeout, and waits until that
/// child is reaped. A timeout or an interrupt may kill the child while the
/// loop is blocked in the wait; the loop only ever observes the result.
///
/// Example
/// ```no_run
/// use shredder::{Config, Interpreter};
/// let mut sh = Interpreter::new(Config::default());
/// sh.repl().unwrap();
/// ```
pub struct Interpreter<R, W> {
    reader: LineReader<R>,
    output: W,
    processes: ProcessController,
    timer: TimeoutTimer,
}

impl Interpreter<RawStdin, RawStdout> {
    /// Shell over the process's own stdin/stdout, tracking children in the
    /// slot the signal handlers look at.
    pub fn new(config: Config) -> Self {
        Self::with_io(config, RawStdin, RawStdout, &CURRENT_CHILD)
    }
}

impl<R: Read, W: Write> Interpreter<R, W> {
    pub fn with_io(config: Config, input: R, output: W, slot: &'static ChildSlot) -> Self {
        Self {
            reader: LineReader::new(input),
            output,
            processes: ProcessController::new(slot),
            timer: TimeoutTimer::new(config.timeout),
        }
    }

    /// Run until end of input.
    ///
    /// Returns `Ok(())` only when the input is closed; every other way out is
    /// a fatal error.
    pub fn repl(&mut self) -> Result<()> {
        debug!(timeout = %self.timer.timeout(), "shell started");
        loop {
            if self.execute_shell()? == Iteration::EndOfInput {
                debug!("end of input");
                return Ok(());
            }
        }
    }

    /// One pass: prompt, read, and run what was read.
    pub fn execute_shell(&mut self) -> Result<Iteration> {
        write_all(&mut self.output, PROMPT.as_bytes())?;

        match self.reader.read_command()? {
            ReadOutcome::EndOfInput => Ok(Iteration::EndOfInput),
            ReadOutcome::Blank => {
                trace!("blank line");
                Ok(Iteration::Idle)
            }
            ReadOutcome::Command(command) => self.run(command).map(Iteration::Ran),
        }
    }

    fn run(&mut self, command: CommandLine) -> Result<TerminationStatus> {
        let child = self.processes.spawn(&command)?;
        // Armed only once the pid is published, so an expiry always has a
        // child to act on.
        self.timer.arm();
        let status = self.processes.await_termination(child);
        self.timer.disarm();
        let status = status?;
        debug!(command = %command, code = status.code(), "command finished");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Timeout;
    use nix::sys::signal::Signal;
    use std::collections::VecDeque;
    use std::io::Result as IoResult;
    use std::thread;
    use std::time::Duration;

    /// Hands out one chunk per read, like a terminal delivering lines.
    struct Lines(VecDeque<&'static [u8]>);

    impl Lines {
        fn new(lines: &[&'static str]) -> Self {
            Self(lines.iter().map(|l| l.as_bytes()).collect())
        }
    }

    impl Read for Lines {
        fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
            match self.0.pop_front() {
                Some(mut chunk) => chunk.read(out),
                None => Ok(0),
            }
        }
    }

    fn shell(lines: &[&'static str], slot: &'static ChildSlot) -> Interpreter<Lines, Vec<u8>> {
        Interpreter::with_io(Config::default(), Lines::new(lines), Vec::new(), slot)
    }

    #[test]
    fn blank_lines_prompt_again_without_spawning() {
        static SLOT: ChildSlot = ChildSlot::new();
        let mut sh = shell(&["   \n", "\t\n"], &SLOT);

        assert_eq!(sh.execute_shell().unwrap(), Iteration::Idle);
        assert_eq!(sh.execute_shell().unwrap(), Iteration::Idle);
        assert_eq!(sh.execute_shell().unwrap(), Iteration::EndOfInput);
        assert_eq!(sh.output, PROMPT.repeat(3).into_bytes());
        assert_eq!(SLOT.current(), None);
    }

    #[test]
    fn commands_run_to_completion_and_loop_back() {
        static SLOT: ChildSlot = ChildSlot::new();
        let mut sh = shell(&["  /bin/true \n", "/bin/false\n"], &SLOT);

        assert_eq!(
            sh.execute_shell().unwrap(),
            Iteration::Ran(TerminationStatus::Exited(0))
        );
        assert_eq!(SLOT.current(), None);
        assert_eq!(
            sh.execute_shell().unwrap(),
            Iteration::Ran(TerminationStatus::Exited(1))
        );
        assert_eq!(sh.execute_shell().unwrap(), Iteration::EndOfInput);
    }

    #[test]
    fn failed_launch_does_not_stop_the_shell() {
        static SLOT: ChildSlot = ChildSlot::new();
        let mut sh = shell(&["/no/such/program\n", "/bin/true\n"], &SLOT);

        assert_eq!(
            sh.execute_shell().unwrap(),
            Iteration::Ran(TerminationStatus::Exited(1))
        );
        assert_eq!(
            sh.execute_shell().unwrap(),
            Iteration::Ran(TerminationStatus::Exited(0))
        );
    }

    #[test]
    fn repl_ends_cleanly_on_end_of_input() {
        static SLOT: ChildSlot = ChildSlot::new();
        let mut sh = shell(&["\n", "/bin/true\n"], &SLOT);

        sh.repl().unwrap();
        assert_eq!(sh.output, PROMPT.repeat(3).into_bytes());
    }

    #[test]
    fn child_killed_from_outside_is_reaped_as_signaled() {
        static SLOT: ChildSlot = ChildSlot::new();
        let script = crate::test_support::long_running_script();
        let line: &'static str = Box::leak(format!("{}\n", script).into_boxed_str());
        let mut sh = Interpreter::with_io(
            Config {
                timeout: Timeout::DISABLED,
            },
            Lines::new(&[line]),
            Vec::new(),
            &SLOT,
        );

        let killer = thread::spawn(|| {
            let pc = ProcessController::new(&SLOT);
            while SLOT.current().is_none() {
                thread::sleep(Duration::from_millis(10));
            }
            pc.force_terminate().unwrap()
        });

        assert_eq!(
            sh.execute_shell().unwrap(),
            Iteration::Ran(TerminationStatus::Signaled(Signal::SIGKILL))
        );
        assert!(killer.join().unwrap());
        assert_eq!(SLOT.current(), None);
    }
}
