use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Interpreter-level view of the process environment.
///
/// The environment contains:
/// - `vars`: variables handed to every spawned program, and consulted by `cd`
///   for `HOME`.
/// - `current_dir`: the working directory last set by `cd` (or inherited at
///   startup); children are started in it.
/// - `should_exit`: set by `exit`; the interpreter stops the current line and
///   the front-end terminates the process.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// An environment with no variables, rooted at the process working directory.
    ///
    /// Lookups still fall back to the real process environment.
    pub fn empty() -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            should_exit: false,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
