//! A small line-oriented command interpreter.
//!
//! A line holds one or more `;`-separated commands. Each one is either a
//! built-in (`cd`, `pwd`, `exit`) run in-process, or an external program
//! started as a child process and waited for, optionally with its standard
//! output sent to a new file (`command > file`).
//!
//! The main entry point is [`Interpreter`]: [`Interpreter::run_line`] processes
//! one line and reports the outcome of every sub-command, while
//! [`Interpreter::repl`] and [`Interpreter::run_batch`] are the interactive and
//! batch front-ends. Whatever goes wrong, the user only ever sees
//! [`diagnostic::GENERIC_MESSAGE`]; the [`error`] types carry the detail.
//!
//! Unix only: redirection rebinds the stdout file descriptor.

mod builtin;
pub mod command;
pub mod config;
pub mod diagnostic;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod lexer;
pub mod parser;
mod redirect;

pub use config::Config;
pub use error::{ShellError, ShellResult};
pub use interpreter::{FailurePolicy, Interpreter, LineReport, SubCommandOutcome};
pub use lexer::MAX_LINE_LEN;
