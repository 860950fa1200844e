//! System prompt template handling.
//!
//! The template file is re-read on every call so operators can edit it while
//! the server runs. It is rendered with [`minijinja`] in strict mode: a
//! reference to a variable the gateway does not supply is a render error, not
//! an empty string. Available variables are `username`, `role`, `location`
//! and `date`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use tracing::{debug, warn};

use crate::UserContext;

/// Prompt used whenever the template cannot be loaded or rendered.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful Supply Chain AI Agent.";

/// Where the active system prompt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    /// Rendered from the operator's template file.
    Template,
    /// The built-in [`DEFAULT_SYSTEM_PROMPT`].
    Default,
}

/// A fully rendered system prompt for one agent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt {
    pub text: String,
    pub source: PromptSource,
}

impl SystemPrompt {
    fn fallback() -> Self {
        Self {
            text: DEFAULT_SYSTEM_PROMPT.to_owned(),
            source: PromptSource::Default,
        }
    }
}

#[derive(Serialize)]
struct PromptVars<'a> {
    username: &'a str,
    role: &'a str,
    location: &'a str,
    date: String,
}

/// File-backed system prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    path: PathBuf,
}

impl PromptTemplate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the template for `user` as of `date`.
    ///
    /// Never fails: a missing file or a render error is logged and the
    /// default prompt is returned instead.
    pub async fn render(&self, user: &UserContext, date: NaiveDate) -> SystemPrompt {
        let source = match tokio::fs::read_to_string(&self.path).await {
            Ok(source) => source,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "system prompt template unavailable; using default prompt"
                );
                return SystemPrompt::fallback();
            }
        };

        let vars = PromptVars {
            username: &user.username,
            role: &user.role,
            location: user.location.as_deref().unwrap_or("Unknown"),
            date: date.format("%Y-%m-%d").to_string(),
        };

        match render_strict(&source, &vars) {
            Ok(text) => {
                debug!(path = %self.path.display(), len = text.len(), "system prompt rendered");
                SystemPrompt {
                    text,
                    source: PromptSource::Template,
                }
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "system prompt template failed to render; using default prompt"
                );
                SystemPrompt::fallback()
            }
        }
    }
}

fn render_strict(source: &str, vars: &PromptVars<'_>) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.render_str(source, vars)
}
