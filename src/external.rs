use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::diagnostic;
use crate::env::Environment;
use crate::error::{ShellError, ShellResult};
use crate::interpreter::Factory;
use crate::lexer::ArgumentVector;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Exit code recorded for a program that could not be started.
pub const NOT_STARTED: ExitCode = 0;

/// Command that is not a builtin.
pub struct ExternalCommand {
    name: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: OsString, args: Vec<OsString>) -> Self {
        Self { name, args }
    }

    pub fn from_argv(argv: &ArgumentVector) -> Self {
        Self::new(
            argv.program().into(),
            argv.args().iter().map(OsString::from).collect(),
        )
    }

    /// The program could not be located or started.
    ///
    /// Behaves like a child that printed the diagnostic and exited cleanly.
    fn not_started(&self, stdout: &mut dyn Write, reason: &dyn std::fmt::Display) -> ShellResult<ExitCode> {
        tracing::debug!(program = ?self.name, %reason, "program not started");
        if let Err(e) = diagnostic::emit(stdout) {
            tracing::warn!("could not write diagnostic: {}", e);
        }
        Ok(NOT_STARTED)
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    /// Accepts every name; resolution against PATH happens at execution time.
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        Some(Box::new(ExternalCommand::new(
            name.into(),
            args.iter().map(OsString::from).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> ShellResult<ExitCode> {
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let Some(executable) = find_command_path(OsStr::new(&search_paths), Path::new(&self.name))
            .map(Cow::into_owned)
        else {
            return self.not_started(stdout, &"not found in PATH");
        };

        // Anything still buffered must reach the descriptor before the child does.
        stdout.flush().map_err(ShellError::Spawn)?;

        let spawned = std::process::Command::new(&executable)
            .arg0(&self.name)
            .args(&self.args)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if is_not_startable(&e) => return self.not_started(stdout, &e),
            Err(e) => return Err(ShellError::Spawn(e)),
        };

        let exit_status = child.wait().map_err(ShellError::Spawn)?;
        let code = match exit_status.code() {
            Some(x) => x,
            None => terminated_by_signal(exit_status),
        };
        tracing::debug!(program = %executable.display(), code, "child exited");
        Ok(code)
    }
}

/// Spawn errors that mean "this program can't run" rather than "the OS could
/// not create a process".
fn is_not_startable(e: &io::Error) -> bool {
    const ENOEXEC: i32 = 8;
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) || e.raw_os_error() == Some(ENOEXEC)
}

fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an executable file.
/// - `./foo` or a relative path with multiple components (e.g., `bin/sh`):
///   returns it if it is an executable file.
/// - Single path component (no separators): search each directory in
///   `search_paths` (PATH) and return the first executable match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| find_by_path(candidate).is_some())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    let meta = path.metadata().ok()?;
    if meta.is_file() && meta.permissions().mode() & 0o111 != 0 {
        Some(path)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::tests::lock_current_dir;
    use std::fs;
    use std::fs::File;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    fn make_executable(path: &Path) {
        fs::write(path, "#!/bin/sh\nexit 0\n").expect("write script");
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }

    #[test]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/bin"), path)
            .expect("Expected to find /bin/sh via absolute path");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    fn absolute_nonexisting() {
        let path = Path::new("/bin/nonexisting");
        assert!(find_command_path(osstr("/bin"), path).is_none());
    }

    #[test]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/nonexistent_dir:/bin"), Path::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting"));
        assert!(res.is_none(), "Expected not to find 'nonexisting' in PATH");
    }

    #[test]
    fn non_executable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("plain")).unwrap();
        let search = dir.path().as_os_str().to_owned();

        assert!(find_command_path(&search, Path::new("plain")).is_none());
    }

    #[test]
    fn multiple_components_relative_existing() {
        let _lock = lock_current_dir();
        let cwd_before = std::env::current_dir().expect("cwd");
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("bin")).expect("create temp bin dir");
        make_executable(&tmp.path().join("bin").join("tool"));

        std::env::set_current_dir(tmp.path()).expect("set cwd");
        let res = find_command_path(osstr("/does/not/matter"), Path::new("bin/tool"))
            .map(Cow::into_owned);
        std::env::set_current_dir(&cwd_before).ok();

        let found = res.expect("Expected to find relative 'bin/tool' in current dir");
        assert!(found.ends_with("bin/tool"));
    }

    #[test]
    fn current_dir_with_dot_prefix() {
        let _lock = lock_current_dir();
        let cwd_before = std::env::current_dir().expect("cwd");
        let tmp = tempfile::tempdir().unwrap();
        make_executable(&tmp.path().join("foo"));

        std::env::set_current_dir(tmp.path()).expect("set cwd");
        let res = find_command_path(osstr("/bin"), Path::new("./foo")).map(Cow::into_owned);
        std::env::set_current_dir(&cwd_before).ok();

        assert_eq!(res.as_deref(), Some(Path::new("./foo")));
    }

    #[test]
    fn empty_path_is_none() {
        assert!(find_command_path(osstr("/bin"), Path::new("")).is_none());
    }

    #[test]
    fn missing_program_reports_and_completes() {
        let mut env = Environment::empty();
        let cmd = Box::new(ExternalCommand::new(
            "myshell_no_such_program_42".into(),
            Vec::new(),
        ));

        let mut out = Vec::new();
        let code = cmd.execute(&mut out, &mut env).expect("not-found is not a failure");

        assert_eq!(code, NOT_STARTED);
        assert_eq!(out, diagnostic::GENERIC_MESSAGE.as_bytes());
    }

    #[test]
    fn runs_program_and_returns_exit_code() {
        let _lock = lock_current_dir();
        let mut env = Environment::new();

        let ok = Box::new(ExternalCommand::new("true".into(), Vec::new()));
        assert_eq!(ok.execute(&mut Vec::new(), &mut env).unwrap(), 0);

        let failing = Box::new(ExternalCommand::new("sh".into(), vec!["-c".into(), "exit 3".into()]));
        assert_eq!(failing.execute(&mut Vec::new(), &mut env).unwrap(), 3);
    }

    #[test]
    fn child_sees_interpreter_environment() {
        let _lock = lock_current_dir();
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");

        let mut env = Environment::new();
        env.current_dir = dir.path().to_path_buf();
        env.set_var("MYSHELL_TEST_VALUE", "hello");

        let cmd = Box::new(ExternalCommand::new(
            "sh".into(),
            vec!["-c".into(), "printf %s \"$MYSHELL_TEST_VALUE\" > marker".into()],
        ));
        assert_eq!(cmd.execute(&mut Vec::new(), &mut env).unwrap(), 0);

        assert_eq!(fs::read_to_string(marker).unwrap(), "hello");
    }
}
