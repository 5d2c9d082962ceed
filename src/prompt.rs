//! Prompt providers
//!
//! The store never talks to a terminal directly; it asks a `Prompter`.

use console::Term;
use std::collections::VecDeque;
use zeroize::Zeroizing;

use crate::error::{CredError, CredResult};

/// Interactive input needed by save and delete
pub trait Prompter {
    /// Ask for a secret. `None` or an empty value means the user cancelled.
    fn read_secret(&mut self, prompt: &str) -> CredResult<Option<Zeroizing<String>>>;

    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&mut self, message: &str) -> CredResult<bool>;
}

fn prompt_error(err: std::io::Error) -> CredError {
    CredError::Prompt(err.to_string())
}

/// Prompts on stderr, hidden input for secrets
pub struct TerminalPrompter {
    term: Term,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn read_secret(&mut self, prompt: &str) -> CredResult<Option<Zeroizing<String>>> {
        self.term
            .write_str(&format!("{} (leave empty to cancel): ", prompt))
            .map_err(prompt_error)?;
        let secret = Zeroizing::new(self.term.read_secure_line().map_err(prompt_error)?);
        if secret.is_empty() {
            return Ok(None);
        }
        Ok(Some(secret))
    }

    fn confirm(&mut self, message: &str) -> CredResult<bool> {
        self.term
            .write_str(&format!("{} [y/N]: ", message))
            .map_err(prompt_error)?;
        let answer = self.term.read_line().map_err(prompt_error)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

/// Replays a fixed script of answers
///
/// Once a queue runs dry, secrets cancel and confirmations decline.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    secrets: VecDeque<String>,
    confirmations: VecDeque<bool>,
    prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secrets<I, S>(mut self, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secrets.extend(secrets.into_iter().map(Into::into));
        self
    }

    pub fn with_confirmations(mut self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.confirmations.extend(answers);
        self
    }

    /// Every prompt and confirmation message shown so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Prompter for ScriptedPrompter {
    fn read_secret(&mut self, prompt: &str) -> CredResult<Option<Zeroizing<String>>> {
        self.prompts.push(prompt.to_string());
        Ok(self
            .secrets
            .pop_front()
            .filter(|s| !s.is_empty())
            .map(Zeroizing::new))
    }

    fn confirm(&mut self, message: &str) -> CredResult<bool> {
        self.prompts.push(message.to_string());
        Ok(self.confirmations.pop_front().unwrap_or(false))
    }
}
