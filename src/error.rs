//! credcache Error Types
//!
//! Crate-wide error type plus the serializable error shape the CLI prints.

use serde::Serialize;
use thiserror::Error;

use crate::secrets::vault::VaultError;

/// credcache error
#[derive(Error, Debug)]
pub enum CredError {
    #[error(
        "No credential saved for '{user_name}' in context '{context}'. \
         Create one first with `credcache save {user_name} {context}`"
    )]
    NotFound { context: String, user_name: String },

    #[error("Credential cannot be decrypted by the current user on this machine: {0}")]
    Decryption(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Invalid master key format")]
    InvalidMasterKey,

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Verification could not run: {0}")]
    Verification(String),

    #[error("Refusing to remove {0}: it does not look like a credential store")]
    NotAStore(String),
}

impl CredError {
    pub(crate) fn not_found(context: &str, user_name: &str) -> Self {
        CredError::NotFound {
            context: context.to_string(),
            user_name: user_name.to_string(),
        }
    }
}

pub type CredResult<T> = Result<T, CredError>;

/// Error shape reported by CLI commands
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<CredError> for CommandError {
    fn from(error: CredError) -> Self {
        let code = match &error {
            CredError::NotFound { .. } => "NOT_FOUND",
            CredError::Decryption(_) => "DECRYPTION_FAILED",
            CredError::InvalidName(_) => "INVALID_NAME",
            CredError::Keychain(_) => "KEYCHAIN_ERROR",
            CredError::InvalidMasterKey => "INVALID_MASTER_KEY",
            CredError::Vault(_) => "VAULT_ERROR",
            CredError::Io(_) => "IO_ERROR",
            CredError::Prompt(_) => "PROMPT_ERROR",
            CredError::Verification(_) => "VERIFICATION_ERROR",
            CredError::NotAStore(_) => "NOT_A_STORE",
        };

        CommandError {
            code: code.to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// CLI command result type
pub type CommandResult<T> = Result<T, CommandError>;
