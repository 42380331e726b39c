use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::{BuiltinError, ShellResult};
use crate::interpreter::Factory;
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process. They only ever run on the
/// direct path; a redirected sub-command naming one is refused by the parser.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Most tokens accepted after the name, counted before any parsing.
    /// `None` means any number.
    const MAX_ARGS: Option<usize>;

    /// Executes the command, writing any output to `stdout`.
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode, BuiltinError>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> ShellResult<ExitCode> {
        Ok(<T as BuiltinCommand>::execute(*self, stdout, env)?)
    }
}

/// Stand-in for a builtin whose arguments did not parse.
///
/// argh's own output (usage text or `--help`) is discarded: every such case is
/// a failure reported through the generic diagnostic.
struct InvalidArgs {
    name: String,
    output: String,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> ShellResult<ExitCode> {
        tracing::debug!(name = %self.name, output = %self.output.trim_end(), "rejected builtin arguments");
        Err(BuiltinError::Usage { name: self.name }.into())
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        if let Some(max) = T::MAX_ARGS.filter(|&max| args.len() > max) {
            return Some(Box::new(InvalidArgs {
                name: name.to_owned(),
                output: format!("expected at most {} argument(s), got {}", max, args.len()),
            }));
        }

        // Builtins take no flags: every token is positional, even `--` or `-x`.
        let tokens: Vec<&str> = std::iter::once("--").chain(args.iter().copied()).collect();
        Some(match T::from_args(&[name], &tokens) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, .. }) => Box::new(InvalidArgs {
                name: name.to_owned(),
                output,
            }),
        })
    }
}

#[derive(FromArgs)]
/// Print the shell's working directory.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    const MAX_ARGS: Option<usize> = Some(0);

    fn execute(
        self,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode, BuiltinError> {
        let cwd = env::current_dir().map_err(BuiltinError::CurrentDir)?;
        writeln!(stdout, "{}", cwd.to_string_lossy())
            .and_then(|_| stdout.flush())
            .map_err(|source| BuiltinError::Write {
                name: "pwd",
                source,
            })?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the shell's working directory, or go to $HOME without an argument.
pub struct Cd {
    #[argh(positional)]
    /// new working directory
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    const MAX_ARGS: Option<usize> = Some(1);

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode, BuiltinError> {
        let target = match self.target {
            Some(t) => PathBuf::from(t),
            None => PathBuf::from(env.get_var("HOME").ok_or(BuiltinError::HomeNotSet)?),
        };

        env::set_current_dir(&target).map_err(|source| BuiltinError::ChangeDir {
            path: target.clone(),
            source,
        })?;
        env.current_dir = env::current_dir().unwrap_or(target);
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional)]
    /// ignored; the shell always exits with status 0
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    const MAX_ARGS: Option<usize> = None;

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode, BuiltinError> {
        env.should_exit = true;
        Ok(0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    /// Serializes tests that read or change the process working directory.
    pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn run(name: &str, args: &[&str], out: &mut Vec<u8>, env: &mut Environment) -> ShellResult<ExitCode> {
        let cmd = match name {
            "cd" => Factory::<Cd>::default().try_create(env, name, args),
            "pwd" => Factory::<Pwd>::default().try_create(env, name, args),
            "exit" => Factory::<Exit>::default().try_create(env, name, args),
            _ => None,
        }
        .expect("builtin factory must recognize its own name");
        cmd.execute(out, env)
    }

    #[test]
    fn test_factory_ignores_other_names() {
        let env = Environment::empty();
        assert!(Factory::<Cd>::default().try_create(&env, "ls", &[]).is_none());
        assert!(Factory::<Pwd>::default().try_create(&env, "cd", &[]).is_none());
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let cur = env::current_dir().unwrap();
        let mut env = Environment::empty();

        let mut out = Vec::new();
        let res = run("pwd", &[], &mut out, &mut env);

        assert!(res.is_ok());
        let s = String::from_utf8(out).unwrap();
        assert_eq!(s, format!("{}\n", cur.to_string_lossy()));
        assert!(s.ends_with('\n') && !s.ends_with("\n\n"));
    }

    #[test]
    fn test_pwd_with_arguments_fails() {
        let mut env = Environment::empty();
        for args in [&["x"][..], &["-L"][..], &["--help"][..], &["--"][..], &["a", "b"][..]] {
            let mut out = Vec::new();
            let res = run("pwd", args, &mut out, &mut env);
            assert!(res.is_err(), "pwd {:?} should fail", args);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        let orig = env::current_dir().unwrap();
        let mut env = Environment::empty();

        let target = canonical_temp.to_string_lossy().to_string();
        let res = run("cd", &[target.as_str()], &mut Vec::new(), &mut env);

        let new_cwd = fs::canonicalize(env::current_dir().unwrap()).unwrap();
        env::set_current_dir(&orig).expect("failed to restore cwd");

        assert!(res.is_ok());
        assert_eq!(new_cwd, canonical_temp);
        assert_eq!(fs::canonicalize(&env.current_dir).unwrap(), canonical_temp);
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        let orig = env::current_dir().unwrap();

        let mut env = Environment::empty();
        env.set_var("HOME", canonical_temp.to_string_lossy().to_string());

        let res = run("cd", &[], &mut Vec::new(), &mut env);

        let new_cwd = fs::canonicalize(env::current_dir().unwrap()).unwrap();
        env::set_current_dir(&orig).expect("failed to restore cwd");

        assert!(res.is_ok());
        assert_eq!(new_cwd, canonical_temp);
    }

    #[test]
    fn test_cd_with_two_arguments_fails() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let mut env = Environment::empty();

        // Both arguments are valid directories; the count alone is the problem.
        let res = run("cd", &["/", "/tmp"], &mut Vec::new(), &mut env);

        assert!(res.is_err());
        assert_eq!(env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_counts_dash_tokens_as_arguments() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let mut env = Environment::empty();

        for args in [&["--", "/tmp"][..], &["-x", "y"][..], &["--help", "/"][..]] {
            let res = run("cd", args, &mut Vec::new(), &mut env);
            assert!(
                matches!(res, Err(crate::error::ShellError::Builtin(BuiltinError::Usage { .. }))),
                "cd {:?} should be a usage error",
                args
            );
            assert_eq!(env::current_dir().unwrap(), orig);
        }
    }

    #[test]
    fn test_cd_into_directory_named_like_a_flag() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();
        fs::create_dir(canonical_temp.join("-foo")).unwrap();
        let orig = env::current_dir().unwrap();
        env::set_current_dir(&canonical_temp).unwrap();
        let mut env = Environment::empty();

        let res = run("cd", &["-foo"], &mut Vec::new(), &mut env);

        let new_cwd = env::current_dir().unwrap();
        env::set_current_dir(&orig).expect("failed to restore cwd");

        assert!(res.is_ok());
        assert_eq!(new_cwd, canonical_temp.join("-foo"));
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = env::current_dir().unwrap();
        let mut env = Environment::empty();

        let name = format!("nonexistent_dir_for_myshell_test_{}", std::process::id());
        let res = run("cd", &[name.as_str()], &mut Vec::new(), &mut env);

        assert!(matches!(
            res,
            Err(crate::error::ShellError::Builtin(BuiltinError::ChangeDir { .. }))
        ));
        assert_eq!(env::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_exit_sets_flag() {
        let mut env = Environment::empty();
        let res = run("exit", &["3"], &mut Vec::new(), &mut env);
        assert_eq!(res.unwrap(), 0);
        assert!(env.should_exit);
    }

    #[test]
    fn test_exit_accepts_any_tokens() {
        for args in [&[][..], &["-x"][..], &["--help"][..], &["--"][..], &["-h", "a", "--b"][..]] {
            let mut env = Environment::empty();
            let res = run("exit", args, &mut Vec::new(), &mut env);
            assert_eq!(res.unwrap(), 0, "exit {:?} should succeed", args);
            assert!(env.should_exit);
        }
    }
}
