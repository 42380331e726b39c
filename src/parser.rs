use crate::error::{RedirectionError, ShellResult};
use crate::lexer::{self, ArgumentVector};

/// Marker that introduces an output redirection.
pub const REDIRECT_MARKER: char = '>';

/// Names that are executed in-process and therefore never redirected.
pub const BUILTIN_NAMES: [&str; 3] = ["cd", "pwd", "exit"];

/// A `command > file` sub-command, split and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionSpec {
    /// Everything before the `>`.
    pub command: String,
    /// The single file name after the `>`.
    pub target: String,
}

/// What a sub-command asks the interpreter to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Run `argv` with the shell's own stdout; built-ins allowed.
    Direct(ArgumentVector),
    /// Run `argv` with stdout bound to `target`; external programs only.
    Redirected {
        argv: ArgumentVector,
        target: String,
    },
}

/// Validate and split a `command > file` sub-command.
///
/// Accepted only when there is exactly one `>`, something other than
/// whitespace on both sides of it, and a single token after it.
///
/// # Returns
/// The trimmed command text and file name, or the first rule that failed.
pub fn parse_redirection(sub_command: &str) -> Result<RedirectionSpec, RedirectionError> {
    let markers = sub_command.matches(REDIRECT_MARKER).count();
    if markers != 1 {
        return Err(RedirectionError::MarkerCount(markers));
    }

    let Some((command, target)) = sub_command.split_once(REDIRECT_MARKER) else {
        return Err(RedirectionError::MarkerCount(0));
    };

    let command = command.trim();
    let target = target.trim();
    if command.is_empty() {
        return Err(RedirectionError::MissingCommand);
    }
    if target.is_empty() {
        return Err(RedirectionError::MissingTarget);
    }
    if target.split_whitespace().nth(1).is_some() {
        return Err(RedirectionError::MultipleTargets);
    }

    Ok(RedirectionSpec {
        command: command.to_owned(),
        target: target.to_owned(),
    })
}

/// Turn one sub-command into an [`Invocation`].
///
/// Any `>` sends the sub-command down the redirection path, where built-ins
/// are refused before anything touches the filesystem.
pub fn parse_invocation(sub_command: &str) -> ShellResult<Invocation> {
    if !sub_command.contains(REDIRECT_MARKER) {
        return Ok(Invocation::Direct(lexer::split_into_tokens(sub_command)?));
    }

    let spec = parse_redirection(sub_command)?;
    let argv = lexer::split_into_tokens(&spec.command)?;
    if is_builtin(argv.program()) {
        return Err(RedirectionError::Builtin(argv.program().to_owned()).into());
    }
    Ok(Invocation::Redirected {
        argv,
        target: spec.target,
    })
}

/// Whether `name` is one of [`BUILTIN_NAMES`].
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}
