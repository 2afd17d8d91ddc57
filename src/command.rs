use crate::error::ShellError;
use crate::io_adapters::errno_of;
use std::ffi::{CStr, CString};
use std::fmt;
use std::io::{ErrorKind, Read};

/// Size of the input buffer. One byte is kept back for the terminator, so a
/// single read transfers at most `INPUT_SIZE - 1` bytes.
pub const INPUT_SIZE: usize = 1024;

/// A single executable path as typed by the user, trimmed and null-terminated.
///
/// The path is never empty and never starts or ends with space, tab or newline.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandLine {
    path: CString,
}

impl CommandLine {
    /// Build a command line from raw input bytes.
    ///
    /// Returns `None` when nothing but whitespace remains after trimming.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        // The buffer is a C string: anything after an embedded NUL is dropped.
        let raw = match raw.iter().position(|&b| b == 0) {
            Some(nul) => &raw[..nul],
            None => raw,
        };
        let trimmed = trim(raw);
        if trimmed.is_empty() {
            return None;
        }
        let path = CString::new(trimmed).ok()?;
        Some(Self { path })
    }

    pub fn as_c_str(&self) -> &CStr {
        &self.path
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.path.as_bytes()
    }
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandLine({:?})", self.path)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

fn is_blank(b: &u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n')
}

fn trim(raw: &[u8]) -> &[u8] {
    let start = raw.iter().position(|b| !is_blank(b)).unwrap_or(raw.len());
    let end = raw.iter().rposition(|b| !is_blank(b)).map_or(start, |i| i + 1);
    &raw[start..end]
}

/// What a single read produced.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The input stream is closed and nothing was transferred.
    EndOfInput,
    /// Only whitespace was read.
    Blank,
    Command(CommandLine),
}

/// Reads one command per call with a single bounded read.
///
/// Input longer than the cap is truncated; the rest stays in the stream and is
/// picked up by the next call.
pub struct LineReader<R> {
    input: R,
}

impl<R: Read> LineReader<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Perform one read and classify it.
    ///
    /// A read interrupted by a signal before any data arrived is retried. Any
    /// other read failure is fatal.
    pub fn read_command(&mut self) -> Result<ReadOutcome, ShellError> {
        let mut buffer = [0u8; INPUT_SIZE];
        let read = loop {
            match self.input.read(&mut buffer[..INPUT_SIZE - 1]) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ShellError::Read(errno_of(&e))),
            }
        };

        if read == 0 {
            return Ok(ReadOutcome::EndOfInput);
        }

        Ok(match CommandLine::parse(&buffer[..read]) {
            Some(command) => ReadOutcome::Command(command),
            None => ReadOutcome::Blank,
        })
    }
}
