//! credcache - per-context credential cache
//!
//! Saves passwords and tokens encrypted on disk, readable only by the same
//! user on the same machine. Other tools fetch a secret with
//! [`CredentialStore::load`] and keep the plaintext in memory only.

pub mod commands;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod prompt;
pub mod secrets;
pub mod verify;

pub use config::StoreConfig;
pub use error::{CredError, CredResult};
pub use identity::Identity;
pub use models::{Credential, RecordKey, SecretRecord};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use secrets::{CredentialStore, DataProtector, DeleteOutcome, KeychainProtector, MasterKeyProtector};
pub use verify::{CommandVerifier, Verifier};
