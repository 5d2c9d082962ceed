//! Host-bound data protection
//!
//! - `DataProtector`: the encrypt/decrypt contract the store depends on
//! - `KeychainProtector`: master key kept in the OS keychain (`credcache:master_key_v1`),
//!   so sealed payloads only open for the same user on the same machine
//! - `MasterKeyProtector`: same sealing with a caller-held key

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use keyring::Entry;
use once_cell::unsync::OnceCell;
use rand::Rng;
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CredError, CredResult};
use crate::secrets::vault::{self, VaultError, MASTER_KEY_LEN};

/// Keychain account holding the master key
const MASTER_KEY_KEYCHAIN_KEY: &str = "master_key_v1";

/// Reversible encryption bound to the current user and machine
pub trait DataProtector {
    /// Encrypt `plaintext`; `associated` is authenticated but not stored.
    fn protect(&self, plaintext: &[u8], associated: &[u8]) -> CredResult<Vec<u8>>;

    /// Decrypt a payload produced by `protect` with the same `associated` data.
    ///
    /// Fails with [`CredError::Decryption`] when the payload was not produced
    /// for the current identity.
    fn unprotect(&self, sealed: &[u8], associated: &[u8]) -> CredResult<Zeroizing<Vec<u8>>>;
}

/// Master key wrapper, zeroized on drop
#[derive(Clone)]
struct MasterKey {
    bytes: [u8; MASTER_KEY_LEN],
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl MasterKey {
    /// Generate a master key (CSPRNG)
    fn generate() -> Self {
        let mut bytes = [0u8; MASTER_KEY_LEN];
        rand::thread_rng().fill(&mut bytes);
        Self { bytes }
    }
}

fn seal_with(key: &MasterKey, plaintext: &[u8], associated: &[u8]) -> CredResult<Vec<u8>> {
    Ok(vault::seal(&key.bytes, plaintext, associated)?)
}

fn open_with(
    key: &MasterKey,
    sealed: &[u8],
    associated: &[u8],
) -> CredResult<Zeroizing<Vec<u8>>> {
    vault::open(&key.bytes, sealed, associated).map_err(|e| {
        if matches!(e, VaultError::Io(_) | VaultError::Serialization(_)) {
            CredError::Vault(e)
        } else {
            CredError::Decryption(e.to_string())
        }
    })
}

/// Protector with a caller-held master key
pub struct MasterKeyProtector {
    key: MasterKey,
}

impl MasterKeyProtector {
    pub fn new(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self {
            key: MasterKey { bytes },
        }
    }

    pub fn generate() -> Self {
        Self {
            key: MasterKey::generate(),
        }
    }
}

impl DataProtector for MasterKeyProtector {
    fn protect(&self, plaintext: &[u8], associated: &[u8]) -> CredResult<Vec<u8>> {
        seal_with(&self.key, plaintext, associated)
    }

    fn unprotect(&self, sealed: &[u8], associated: &[u8]) -> CredResult<Zeroizing<Vec<u8>>> {
        open_with(&self.key, sealed, associated)
    }
}

/// Protector whose master key lives in the OS keychain
///
/// The key is loaded at most once per protector:
/// 1. `protect` loads it, generating and saving a new one if absent
/// 2. `unprotect` only loads it; absence means nothing this user saved can be opened
pub struct KeychainProtector {
    service: String,
    key: OnceCell<MasterKey>,
}

impl KeychainProtector {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            key: OnceCell::new(),
        }
    }

    fn key_for_write(&self) -> CredResult<&MasterKey> {
        self.key.get_or_try_init(|| match self.load_master_key_from_keychain()? {
            Some(key) => {
                debug!(service = %self.service, "master key loaded from keychain");
                Ok(key)
            }
            None => {
                info!(service = %self.service, "no master key found, generating a new one");
                let key = MasterKey::generate();
                self.save_master_key_to_keychain(&key)?;
                Ok(key)
            }
        })
    }

    fn key_for_read(&self) -> CredResult<&MasterKey> {
        self.key.get_or_try_init(|| {
            self.load_master_key_from_keychain()?.ok_or_else(|| {
                CredError::Decryption(format!(
                    "no master key in the keychain for service '{}'",
                    self.service
                ))
            })
        })
    }

    fn entry(&self) -> CredResult<Entry> {
        Entry::new(&self.service, MASTER_KEY_KEYCHAIN_KEY)
            .map_err(|e| CredError::Keychain(e.to_string()))
    }

    /// Load the master key from the keychain
    fn load_master_key_from_keychain(&self) -> CredResult<Option<MasterKey>> {
        let password = match self.entry()?.get_password() {
            Ok(password) => Zeroizing::new(password),
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(CredError::Keychain(e.to_string())),
        };

        let decoded = Zeroizing::new(
            BASE64
                .decode(password.as_bytes())
                .map_err(|_| CredError::InvalidMasterKey)?,
        );
        if decoded.len() != MASTER_KEY_LEN {
            return Err(CredError::InvalidMasterKey);
        }

        let mut bytes = [0u8; MASTER_KEY_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Some(MasterKey { bytes }))
    }

    /// Save the master key to the keychain
    fn save_master_key_to_keychain(&self, key: &MasterKey) -> CredResult<()> {
        let encoded = Zeroizing::new(BASE64.encode(&key.bytes));
        self.entry()?
            .set_password(&encoded)
            .map_err(|e| CredError::Keychain(e.to_string()))
    }
}

impl DataProtector for KeychainProtector {
    fn protect(&self, plaintext: &[u8], associated: &[u8]) -> CredResult<Vec<u8>> {
        seal_with(self.key_for_write()?, plaintext, associated)
    }

    fn unprotect(&self, sealed: &[u8], associated: &[u8]) -> CredResult<Zeroizing<Vec<u8>>> {
        open_with(self.key_for_read()?, sealed, associated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_key_protector_roundtrip() {
        let protector = MasterKeyProtector::generate();
        let sealed = protector.protect(b"token", b"aad").unwrap();
        let opened = protector.unprotect(&sealed, b"aad").unwrap();
        assert_eq!(opened.as_slice(), b"token");
    }

    #[test]
    fn test_foreign_key_is_decryption_error() {
        let mine = MasterKeyProtector::new([7u8; MASTER_KEY_LEN]);
        let theirs = MasterKeyProtector::new([9u8; MASTER_KEY_LEN]);

        let sealed = theirs.protect(b"token", b"aad").unwrap();
        assert!(matches!(
            mine.unprotect(&sealed, b"aad"),
            Err(CredError::Decryption(_))
        ));
    }

    #[test]
    fn test_truncated_payload_is_decryption_error() {
        let protector = MasterKeyProtector::generate();
        assert!(matches!(
            protector.unprotect(b"short", b"aad"),
            Err(CredError::Decryption(_))
        ));
    }
}
