//! credcache Data Models
//!
//! - `RecordKey`: validated (context, user name) pair
//! - `Credential`: decrypted user name + secret, memory only
//! - `SecretRecord`: the encrypted form of one saved secret

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::CredResult;
use crate::secrets::layout;

/// Separator between domain and account in a qualified user name (`ACME\jdoe`)
pub const DOMAIN_SEPARATOR: char = '\\';

/// Identifies one saved secret
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    context: String,
    user_name: String,
}

impl RecordKey {
    /// Validate and build a key. Names that cannot live safely on disk are rejected.
    pub fn new(context: impl Into<String>, user_name: impl Into<String>) -> CredResult<Self> {
        let key = Self {
            context: context.into(),
            user_name: user_name.into(),
        };
        layout::validate_key(&key)?;
        Ok(key)
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Domain part of a qualified user name
    pub fn domain(&self) -> Option<&str> {
        self.user_name
            .split_once(DOMAIN_SEPARATOR)
            .map(|(domain, _)| domain)
    }

    /// User name without its domain qualifier
    pub fn account(&self) -> &str {
        self.user_name
            .split_once(DOMAIN_SEPARATOR)
            .map_or(self.user_name.as_str(), |(_, account)| account)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' in context '{}'", self.user_name, self.context)
    }
}

/// User name plus decrypted secret
///
/// The secret is wiped from memory on drop and never shown by `Debug`.
#[derive(Clone)]
pub struct Credential {
    user_name: String,
    secret: Zeroizing<String>,
}

impl Credential {
    pub fn new(user_name: impl Into<String>, secret: Zeroizing<String>) -> Self {
        Self {
            user_name: user_name.into(),
            secret,
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Plaintext secret. Keep the borrow short.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_name", &self.user_name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Encrypted form of one saved secret, as read from disk
#[derive(Debug, Clone)]
pub struct SecretRecord {
    pub key: RecordKey,
    /// base64 of the host-protected payload
    pub encrypted_payload: String,
    pub saved_at: DateTime<Utc>,
}
