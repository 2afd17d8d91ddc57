//! A tiny interactive shell that runs one program per line.
//!
//! Every line read from standard input is taken as the path of a single
//! executable. It is launched with no arguments besides its own path and an
//! empty environment, and the shell waits for it before prompting again. An
//! optional timeout kills commands that run too long, and `Ctrl-C` kills the
//! running command without touching the shell.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the
//! pieces it is built from so they can be driven on their own, e.g. with
//! in-memory input in tests.

pub mod command;
pub mod config;
pub mod error;
pub mod external;
pub mod interpreter;
pub mod io_adapters;
pub mod signals;
pub mod timer;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::ShellError;
/// Just a convenient re-export of the interactive loop.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
