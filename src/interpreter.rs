use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::config::Config;
use crate::diagnostic;
use crate::env::Environment;
use crate::error::{ShellError, ShellResult};
use crate::external::ExternalCommand;
use crate::lexer::{self, ArgumentVector};
use crate::parser::{self, Invocation};
use crate::redirect::{self, StdoutRedirect};
use anyhow::{Context, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: BuiltinCommand and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// What to do with the rest of a line once one of its sub-commands fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Skip the remaining sub-commands (interactive mode).
    StopLine,
    /// Carry on with the next sub-command (batch mode).
    Continue,
}

/// Result of one sub-command of a line.
#[derive(Debug)]
pub struct SubCommandOutcome {
    pub command: String,
    pub result: ShellResult<()>,
}

/// Everything that happened while running one line.
#[derive(Debug, Default)]
pub struct LineReport {
    /// Outcomes of the sub-commands that were attempted, in order.
    pub outcomes: Vec<SubCommandOutcome>,
    /// `exit` ran; nothing after it on the line was attempted.
    pub exit_requested: bool,
}

impl LineReport {
    pub fn failures(&self) -> impl Iterator<Item = &ShellError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter maintains an [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried to create commands by name. See [`Default`] for the built-in
/// factories included out of the box.
///
/// Example
/// ```
/// use myshell::{FailurePolicy, Interpreter};
/// let mut sh = Interpreter::default();
/// let code = sh.run("true", &[]).unwrap();
/// assert_eq!(code, 0);
///
/// let report = sh.run_line("true ; ; true", FailurePolicy::StopLine).unwrap();
/// assert_eq!(report.outcomes.len(), 2);
/// assert!(report.is_success());
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Built-ins write to the process stdout. Returns the command's exit code
    /// or the reason it could not run.
    pub fn run(&mut self, name: &str, args: &[&str]) -> ShellResult<ExitCode> {
        self.run_with_output(name, args, &mut io::stdout())
    }

    fn run_with_output(
        &mut self,
        name: &str,
        args: &[&str],
        stdout: &mut dyn Write,
    ) -> ShellResult<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, name, args) {
                return cmd.execute(stdout, &mut self.env);
            }
        }
        Err(ShellError::Spawn(io::Error::new(
            io::ErrorKind::NotFound,
            format!("command not found: {}", name),
        )))
    }

    /// Process one raw line, writing built-in output to the process stdout.
    ///
    /// Failures are only returned, never printed.
    pub fn run_line(&mut self, line: &str, policy: FailurePolicy) -> ShellResult<LineReport> {
        self.run_line_with(line, policy, &mut io::stdout(), |_, _| {})
    }

    /// Process one raw line.
    ///
    /// An over-long line is rejected as a whole before anything runs. Otherwise
    /// the sub-commands run one after another; `on_failure` is called as soon as
    /// one fails, before the next is attempted, and `policy` decides whether
    /// the next one is attempted at all. `exit` always ends the line.
    pub fn run_line_with<F>(
        &mut self,
        line: &str,
        policy: FailurePolicy,
        stdout: &mut dyn Write,
        mut on_failure: F,
    ) -> ShellResult<LineReport>
    where
        F: FnMut(&mut dyn Write, &ShellError),
    {
        lexer::check_line_length(line)?;

        let mut report = LineReport::default();
        for sub_command in lexer::split_into_commands(line) {
            tracing::debug!(sub_command, "executing");
            let result = self.execute_sub_command(sub_command, stdout);
            if let Err(err) = &result {
                tracing::debug!(sub_command, error = %err, "sub-command failed");
                on_failure(&mut *stdout, err);
            }
            let failed = result.is_err();
            report.outcomes.push(SubCommandOutcome {
                command: sub_command.to_owned(),
                result,
            });

            if self.env.should_exit {
                report.exit_requested = true;
                break;
            }
            if failed && policy == FailurePolicy::StopLine {
                break;
            }
        }
        Ok(report)
    }

    fn execute_sub_command(&mut self, sub_command: &str, stdout: &mut dyn Write) -> ShellResult<()> {
        match parser::parse_invocation(sub_command)? {
            Invocation::Direct(argv) => self.execute_direct(&argv, stdout),
            Invocation::Redirected { argv, target } => {
                self.execute_redirected(&argv, Path::new(&target))
            }
        }
    }

    fn execute_direct(&mut self, argv: &ArgumentVector, stdout: &mut dyn Write) -> ShellResult<()> {
        let args: Vec<&str> = argv.args().iter().map(String::as_str).collect();
        let code = self.run_with_output(argv.program(), &args, stdout)?;
        tracing::debug!(program = argv.program(), code, "command finished");
        Ok(())
    }

    /// Run an external program with stdout bound to a new file.
    ///
    /// The guard restores stdout however this function returns.
    fn execute_redirected(&mut self, argv: &ArgumentVector, target: &Path) -> ShellResult<()> {
        let file = redirect::open_target(target)?;
        let _redirect = StdoutRedirect::bind(file)?;

        let cmd = Box::new(ExternalCommand::from_argv(argv));
        let code = cmd.execute(&mut io::stdout(), &mut self.env)?;
        tracing::debug!(program = argv.program(), file = %target.display(), code, "redirected command finished");
        Ok(())
    }

    /// Interactive Read-Eval-Print Loop.
    ///
    /// A failing sub-command prints the diagnostic and abandons the rest of
    /// its line. Returns when input ends, on Ctrl-C, or after `exit`.
    pub fn repl(&mut self, config: &Config) -> anyhow::Result<()> {
        let mut rl =
            DefaultEditor::new().map_err(|e| anyhow!("failed to initialise line editor: {}", e))?;
        let mut stdout = io::stdout();

        loop {
            match rl.readline(&config.prompt) {
                Ok(line) => {
                    if config.history && !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())
                            .map_err(|e| anyhow!("failed to record history: {}", e))?;
                    }
                    if self.interactive_line(&line, &mut stdout)? {
                        return Ok(());
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::debug!("interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(anyhow!("failed to read line: {}", err)),
            }
        }

        Ok(())
    }

    /// Handle one line typed at the prompt. Returns `true` once `exit` ran.
    fn interactive_line(&mut self, line: &str, out: &mut dyn Write) -> io::Result<bool> {
        match self.run_line_with(line, FailurePolicy::StopLine, out, report_failure) {
            Ok(report) => Ok(report.exit_requested),
            Err(err) => {
                // The rejected line is shown back before the diagnostic.
                writeln!(out, "{}", lexer::strip_terminator(line))?;
                diagnostic::report_to(out, &err)?;
                Ok(false)
            }
        }
    }

    /// Run every line of a batch script.
    ///
    /// Each non-blank line is echoed before it runs. A failing sub-command
    /// prints the diagnostic and the line carries on. Returns at end of input
    /// or after `exit`.
    pub fn run_batch<R: BufRead>(&mut self, mut input: R, out: &mut dyn Write) -> anyhow::Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = input
                .read_line(&mut line)
                .context("failed to read batch input")?;
            if read == 0 {
                break;
            }

            if !line.trim().is_empty() {
                out.write_all(line.as_bytes())?;
                out.flush()?;
            }

            match self.run_line_with(&line, FailurePolicy::Continue, out, report_failure) {
                Ok(report) if report.exit_requested => return Ok(()),
                Ok(_) => {}
                Err(err) => diagnostic::report_to(out, &err)?,
            }
        }
        Ok(())
    }
}

fn report_failure(out: &mut dyn Write, err: &ShellError) {
    if let Err(e) = diagnostic::report_to(out, err) {
        tracing::warn!("could not write diagnostic: {}", e);
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `pwd`, `cd`, `exit`
    /// - external command launcher, which accepts any other name
    fn default() -> Self {
        use crate::builtin::*;
        Self::new(vec![
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}
