//! Credential Store module
//!
//! One encrypted file per (context, user name) under the store root.
//!
//! - The master key lives in the OS keychain of the current user
//! - Each secret is sealed with XChaCha20-Poly1305 and bound to its key
//! - Plaintext only exists in memory, inside zeroizing buffers

pub mod layout;
pub mod protector;
pub mod store;
pub mod vault;

pub use protector::{DataProtector, KeychainProtector, MasterKeyProtector};
pub use store::{CredentialStore, DeleteOutcome};
