use crate::error::ShellError;
use nix::errno::Errno;
use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::unistd;
use std::io::{Read, Result as IoResult, Write};
use std::os::fd::BorrowedFd;

/// Unbuffered reader over file descriptor 0.
///
/// Every call to [`Read::read`] is exactly one `read(2)`. Nothing is buffered
/// between calls, so bytes that were not requested stay in the kernel for the
/// processes the shell launches.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdin;

impl Read for RawStdin {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        Ok(unistd::read(STDIN_FILENO, out)?)
    }
}

/// Unbuffered writer over file descriptor 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdout;

impl Write for RawStdout {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        Ok(unistd::write(stdout_fd(), data)?)
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

/// Write the whole of `text` to `out`, turning any failure into a fatal
/// [`ShellError::Write`].
pub fn write_all(out: &mut dyn Write, text: &[u8]) -> Result<(), ShellError> {
    out.write_all(text)
        .and_then(|_| out.flush())
        .map_err(|e| ShellError::Write(errno_of(&e)))
}

pub(crate) fn errno_of(err: &std::io::Error) -> Errno {
    err.raw_os_error().map(Errno::from_raw).unwrap_or(Errno::EIO)
}

/// Async-signal-safe write of a fixed message to stdout.
///
/// Only `write(2)` is used: no locks, no allocation, no formatting. Returns
/// `false` if the message could not be written completely.
pub(crate) fn signal_safe_stdout(text: &[u8]) -> bool {
    signal_safe_write(stdout_fd(), text)
}

/// Same as [`signal_safe_stdout`] but for stderr.
pub(crate) fn signal_safe_stderr(text: &[u8]) -> bool {
    signal_safe_write(stderr_fd(), text)
}

fn signal_safe_write(fd: BorrowedFd<'static>, mut text: &[u8]) -> bool {
    while !text.is_empty() {
        match unistd::write(fd, text) {
            Ok(0) => return false,
            Ok(n) => text = &text[n..],
            Err(Errno::EINTR) => continue,
            Err(_) => return false,
        }
    }
    true
}

fn stdout_fd() -> BorrowedFd<'static> {
    // SAFETY: fd 1 stays open for the lifetime of the process.
    unsafe { BorrowedFd::borrow_raw(STDOUT_FILENO) }
}

fn stderr_fd() -> BorrowedFd<'static> {
    // SAFETY: fd 2 stays open for the lifetime of the process.
    unsafe { BorrowedFd::borrow_raw(STDERR_FILENO) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _data: &[u8]) -> IoResult<usize> {
            Err(Error::from_raw_os_error(Errno::EPIPE as i32))
        }

        fn flush(&mut self) -> IoResult<()> {
            Ok(())
        }
    }

    #[test]
    fn write_all_reports_the_os_error() {
        let err = write_all(&mut BrokenPipe, b"penn-shredder# ").unwrap_err();
        assert_eq!(err, ShellError::Write(Errno::EPIPE));
    }

    #[test]
    fn write_all_into_memory() {
        let mut out = Vec::new();
        write_all(&mut out, b"abc").unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn non_os_errors_map_to_eio() {
        let err = Error::new(ErrorKind::Other, "synthetic");
        assert_eq!(errno_of(&err), Errno::EIO);
    }
}
