/// Prompt shown by the interactive loop unless overridden.
pub const DEFAULT_PROMPT: &str = "myshell> ";

/// Settings for the interactive front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    /// Record entered lines in the line editor's history.
    pub history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            history: true,
        }
    }
}

impl Config {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }
}
