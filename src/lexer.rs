//! Lexical analysis of a raw input line: length check, splitting into
//! sub-commands on `;`, and splitting a sub-command into an argument vector.

use crate::error::{ParseError, ShellError, ShellResult};

/// Longest accepted line, in bytes, not counting the line terminator.
pub const MAX_LINE_LEN: usize = 511;

/// Separator between sub-commands on one line.
const COMMAND_SEPARATOR: char = ';';

/// Characters that separate tokens inside a sub-command.
const TOKEN_SEPARATORS: [char; 2] = [' ', '\t'];

/// Ordered argument list of one command; `argv[0]` is the program name.
///
/// Never empty: the only constructor is [`split_into_tokens`], which refuses
/// empty input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector(Vec<String>);

impl ArgumentVector {
    /// Name of the program to run.
    pub fn program(&self) -> &str {
        &self.0[0]
    }

    /// Positional arguments following the program name.
    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Strip the line terminator (`\n` or `\r\n`) if there is one.
pub fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Reject lines of more than [`MAX_LINE_LEN`] visible bytes.
///
/// The terminator, if present, is not counted.
pub fn check_line_length(line: &str) -> ShellResult<()> {
    let len = strip_terminator(line).len();
    if len > MAX_LINE_LEN {
        return Err(ShellError::LineTooLong { len });
    }
    Ok(())
}

/// Split a line into its sub-commands.
///
/// Pieces are separated by `;`, trimmed, and dropped when nothing but
/// whitespace is left. There is no quoting or escaping of the separator.
///
/// # Arguments
/// * `line` - The raw input line; a trailing terminator is just whitespace here.
///
/// # Returns
/// The non-empty sub-commands in left-to-right order.
pub fn split_into_commands(line: &str) -> Vec<&str> {
    line.split(COMMAND_SEPARATOR)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Split a sub-command into an [`ArgumentVector`].
///
/// Runs of spaces and tabs separate tokens; nothing is quoted, escaped or
/// expanded.
///
/// # Returns
/// `Err(ParseError::EmptyCommand)` if the input holds no token at all.
pub fn split_into_tokens(command: &str) -> Result<ArgumentVector, ParseError> {
    let tokens: Vec<String> = command
        .split(TOKEN_SEPARATORS)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect();

    if tokens.is_empty() {
        return Err(ParseError::EmptyCommand);
    }
    Ok(ArgumentVector(tokens))
}
