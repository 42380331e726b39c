use crate::env::Environment;
use crate::error::ShellResult;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Exit codes of external programs are informational only: a program that
/// ran and exited non-zero is still a completed sub-command.
pub type ExitCode = i32;

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// `stdout` is where in-process output goes; external programs write to
    /// the process stdout descriptor directly.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment)
    -> ShellResult<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
