//! Record sealing and record file I/O
//!
//! Sealed payload format (v1):
//! - magic: `CREDCAC1` (8 bytes)
//! - nonce: 24 bytes (XChaCha20-Poly1305)
//! - ciphertext: AEAD output (ciphertext + tag)
//!
//! AAD: magic + context + NUL + user name, so a payload only opens under the
//! key it was written for.
//!
//! Record files are JSON with the sealed payload base64-encoded.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use zeroize::Zeroizing;

/// Payload magic (8 bytes)
pub const RECORD_MAGIC: &[u8; 8] = b"CREDCAC1";

/// Master key length (256-bit)
pub const MASTER_KEY_LEN: usize = 32;

/// Nonce length (24 bytes for XChaCha20-Poly1305)
pub const NONCE_LEN: usize = 24;

/// Current record file version
pub const RECORD_VERSION: u32 = 1;

/// Vault error
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid vault magic")]
    InvalidMagic,

    #[error("Invalid vault format: {0}")]
    InvalidFormat(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// On-disk record, one per (context, user name)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFile {
    #[serde(default = "default_version")]
    pub version: u32,
    pub context: String,
    pub user_name: String,
    pub saved_at: DateTime<Utc>,
    /// base64(magic || nonce || ciphertext)
    pub payload: String,
}

fn default_version() -> u32 {
    RECORD_VERSION
}

impl RecordFile {
    pub fn new(context: &str, user_name: &str, sealed: &[u8]) -> Self {
        Self {
            version: RECORD_VERSION,
            context: context.to_string(),
            user_name: user_name.to_string(),
            saved_at: Utc::now(),
            payload: BASE64.encode(sealed),
        }
    }

    /// Decode a base64 payload back into sealed bytes
    pub fn decode_payload(payload: &str) -> Result<Vec<u8>, VaultError> {
        BASE64
            .decode(payload.trim())
            .map_err(|e| VaultError::InvalidFormat(format!("payload is not base64: {}", e)))
    }
}

/// Associated data binding a payload to its record key
pub fn associated_data(context: &str, user_name: &str) -> Vec<u8> {
    let mut aad = Vec::with_capacity(RECORD_MAGIC.len() + context.len() + user_name.len() + 1);
    aad.extend_from_slice(RECORD_MAGIC);
    aad.extend_from_slice(context.as_bytes());
    aad.push(0);
    aad.extend_from_slice(user_name.as_bytes());
    aad
}

/// Encrypt `plaintext` with the master key
pub fn seal(
    master_key: &[u8; MASTER_KEY_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, VaultError> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill(&mut nonce);

    let cipher = XChaCha20Poly1305::new(master_key.into());
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;

    let mut sealed = Vec::with_capacity(RECORD_MAGIC.len() + NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(RECORD_MAGIC);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt a sealed payload with the master key
pub fn open(
    master_key: &[u8; MASTER_KEY_LEN],
    sealed: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    if sealed.len() < RECORD_MAGIC.len() + NONCE_LEN {
        return Err(VaultError::InvalidFormat("payload too short".to_string()));
    }

    let (magic, rest) = sealed.split_at(RECORD_MAGIC.len());
    if magic != RECORD_MAGIC {
        return Err(VaultError::InvalidMagic);
    }
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let cipher = XChaCha20Poly1305::new(master_key.into());
    let plaintext = cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|e| VaultError::DecryptionFailed(e.to_string()))?;

    Ok(Zeroizing::new(plaintext))
}

/// Write a record file atomically (temp file + rename)
///
/// On failure the temp file is removed and any previous record is kept.
pub fn write_record(path: &Path, record: &RecordFile) -> Result<(), VaultError> {
    let json = serde_json::to_vec_pretty(record)?;
    let tmp_path = path.with_extension("cred.tmp");

    let written = write_then_rename(&tmp_path, path, &json);
    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

fn write_then_rename(tmp_path: &Path, path: &Path, json: &[u8]) -> Result<(), VaultError> {
    // 1. temp file, owner-only
    let mut file = create_private(tmp_path)?;
    file.write_all(json)?;
    file.sync_all()?;
    drop(file);

    // 2. replace the record in one step
    fs::rename(tmp_path, path)?;
    Ok(())
}

/// Read and parse a record file
pub fn read_record(path: &Path) -> Result<RecordFile, VaultError> {
    let bytes = fs::read(path)?;
    let record: RecordFile = serde_json::from_slice(&bytes)?;
    if record.version > RECORD_VERSION {
        return Err(VaultError::InvalidFormat(format!(
            "unsupported record version {}",
            record.version
        )));
    }
    Ok(record)
}

#[cfg(unix)]
fn create_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn random_key() -> [u8; MASTER_KEY_LEN] {
        let mut key = [0u8; MASTER_KEY_LEN];
        rand::thread_rng().fill(&mut key);
        key
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = random_key();
        let aad = associated_data("Windows", "ACME\\jdoe");

        let sealed = seal(&key, b"s3cr3t", &aad).unwrap();
        assert_eq!(&sealed[..8], RECORD_MAGIC);

        let opened = open(&key, &sealed, &aad).unwrap();
        assert_eq!(opened.as_slice(), b"s3cr3t");
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = random_key();
        let key2 = random_key();
        let aad = associated_data("ctx", "user");

        let sealed = seal(&key1, b"secret", &aad).unwrap();
        let result = open(&key2, &sealed, &aad);
        assert!(matches!(result, Err(VaultError::DecryptionFailed(_))));
    }

    #[test]
    fn test_other_record_key_fails() {
        let key = random_key();
        let sealed = seal(&key, b"secret", &associated_data("a", "admin")).unwrap();

        let result = open(&key, &sealed, &associated_data("b", "admin"));
        assert!(matches!(result, Err(VaultError::DecryptionFailed(_))));
    }

    #[test]
    fn test_bad_magic_and_short_payload() {
        let key = random_key();
        let aad = associated_data("ctx", "user");

        let mut sealed = seal(&key, b"secret", &aad).unwrap();
        sealed[0] = b'X';
        assert!(matches!(open(&key, &sealed, &aad), Err(VaultError::InvalidMagic)));
        assert!(matches!(
            open(&key, b"CREDCAC1", &aad),
            Err(VaultError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_record_file_roundtrip_never_contains_plaintext() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jdoe.cred");
        let key = random_key();
        let aad = associated_data("Windows", "jdoe");

        let sealed = seal(&key, b"hunter2-plaintext", &aad).unwrap();
        write_record(&path, &RecordFile::new("Windows", "jdoe", &sealed)).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("hunter2-plaintext"));
        assert!(!path.with_extension("cred.tmp").exists());

        let record = read_record(&path).unwrap();
        assert_eq!(record.user_name, "jdoe");
        assert_eq!(record.version, RECORD_VERSION);
        let sealed = RecordFile::decode_payload(&record.payload).unwrap();
        let opened = open(&key, &sealed, &aad).unwrap();
        assert_eq!(opened.as_slice(), b"hunter2-plaintext");
    }

    #[cfg(unix)]
    #[test]
    fn test_record_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("jdoe.cred");
        let key = random_key();
        let sealed = seal(&key, b"x", &associated_data("c", "jdoe")).unwrap();
        write_record(&path, &RecordFile::new("c", "jdoe", &sealed)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_garbage_payload_is_invalid_format() {
        assert!(matches!(
            RecordFile::decode_payload("***not base64***"),
            Err(VaultError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let dir = tempdir().unwrap();
        // a non-empty directory where the record should go makes the rename fail
        let path = dir.path().join("jdoe.cred");
        fs::create_dir_all(path.join("occupied")).unwrap();

        let key = random_key();
        let sealed = seal(&key, b"secret", &associated_data("c", "jdoe")).unwrap();
        let result = write_record(&path, &RecordFile::new("c", "jdoe", &sealed));

        assert!(matches!(result, Err(VaultError::Io(_))));
        assert!(!path.with_extension("cred.tmp").exists());
        assert!(path.join("occupied").is_dir());
    }
}
