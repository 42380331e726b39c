//! Error types produced while processing a command line.
//!
//! Every variant here ends up as the same user-visible diagnostic (see
//! [`crate::diagnostic`]); the distinctions exist for control flow, logging
//! and tests.

use std::io;
use std::path::PathBuf;

/// Result alias used throughout the engine.
pub type ShellResult<T> = std::result::Result<T, ShellError>;

/// Failure of a single line or sub-command.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// The raw line exceeded [`crate::MAX_LINE_LEN`] visible bytes.
    #[error("line too long: {len} bytes")]
    LineTooLong { len: usize },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Builtin(#[from] BuiltinError),

    /// The child process could not be created or waited for.
    #[error("failed to run external command: {0}")]
    Spawn(#[source] io::Error),

    #[error(transparent)]
    Redirection(#[from] RedirectionError),
}

/// Errors from the tokenizer.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    EmptyCommand,
}

/// Errors raised by `cd` and `pwd`.
#[derive(Debug, thiserror::Error)]
pub enum BuiltinError {
    /// Wrong number or shape of arguments.
    #[error("{name}: invalid usage")]
    Usage { name: String },

    #[error("cd: no target and HOME not set")]
    HomeNotSet,

    #[error("cd: can't chdir to {}", .path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("pwd: can't read current directory")]
    CurrentDir(#[source] io::Error),

    #[error("{name}: write failed")]
    Write {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Errors from the `cmd > file` syntax and target handling.
#[derive(Debug, thiserror::Error)]
pub enum RedirectionError {
    /// Zero or more than one `>` in the sub-command.
    #[error("expected exactly one '>', found {0}")]
    MarkerCount(usize),

    #[error("nothing to run before '>'")]
    MissingCommand,

    #[error("no file name after '>'")]
    MissingTarget,

    #[error("more than one file name after '>'")]
    MultipleTargets,

    #[error("built-in '{0}' cannot be redirected")]
    Builtin(String),

    #[error("redirection target {} already exists", .0.display())]
    TargetExists(PathBuf),

    #[error("can't open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `dup`/`dup2` on the stdout descriptor failed.
    #[error("can't rebind stdout")]
    Descriptor(#[source] io::Error),
}
