//! Credential Store
//!
//! Save / load / delete secrets keyed by (context, user name). Each record is
//! sealed by a [`DataProtector`] before it touches disk; the plaintext only
//! ever exists in memory.

use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::StoreConfig;
use crate::error::{CredError, CredResult};
use crate::models::{Credential, RecordKey, SecretRecord};
use crate::prompt::Prompter;
use crate::secrets::layout;
use crate::secrets::protector::{DataProtector, KeychainProtector};
use crate::secrets::vault::{self, RecordFile, VaultError};
use crate::verify::Verifier;

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteOutcome {
    /// The target was removed
    Removed,
    /// Nothing existed at the target
    Missing,
    /// The user answered no to the confirmation
    Declined,
    /// `delete_all` was called without the explicit opt-in flag
    NotConfirmed,
}

/// File-per-secret credential store
pub struct CredentialStore<P> {
    root: PathBuf,
    protector: P,
}

impl CredentialStore<KeychainProtector> {
    /// Store at `config.root`, master key in the OS keychain
    pub fn open(config: &StoreConfig) -> Self {
        Self::new(
            config.root.clone(),
            KeychainProtector::new(config.keychain_service.clone()),
        )
    }
}

impl<P: DataProtector> CredentialStore<P> {
    pub fn new(root: impl Into<PathBuf>, protector: P) -> Self {
        Self {
            root: root.into(),
            protector,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Prompt for a secret and save it under `key`
    ///
    /// Prompts until the user cancels or, when a verifier is given, until it
    /// accepts the entered secret. Returns `Ok(None)` on cancel; nothing is
    /// written in that case.
    pub fn save(
        &self,
        key: &RecordKey,
        prompter: &mut dyn Prompter,
        mut verifier: Option<&mut dyn Verifier>,
    ) -> CredResult<Option<Credential>> {
        let prompt = format!("Password for {}", key);

        loop {
            let Some(secret) = prompter.read_secret(&prompt)? else {
                info!(context = key.context(), user_name = key.user_name(), "save cancelled");
                return Ok(None);
            };
            if secret.is_empty() {
                info!(context = key.context(), user_name = key.user_name(), "save cancelled");
                return Ok(None);
            }

            let credential = Credential::new(key.user_name(), secret);

            if let Some(verifier) = verifier.as_deref_mut() {
                if !verifier.verify(&credential)? {
                    warn!(
                        context = key.context(),
                        user_name = key.user_name(),
                        "credential verification failed, try again"
                    );
                    continue;
                }
            }

            self.write(key, &credential)?;
            return Ok(Some(credential));
        }
    }

    /// Seal and write `credential` under `key` without prompting
    pub fn store(&self, key: &RecordKey, credential: &Credential) -> CredResult<()> {
        self.write(key, credential).map(|_| ())
    }

    /// Decrypt the secret saved under `key`
    pub fn load(&self, key: &RecordKey) -> CredResult<Credential> {
        // 1. record file (NotFound when absent)
        let record = self.read_record(key)?;

        // 2. payload back to sealed bytes; garbage here means a damaged record
        let sealed = RecordFile::decode_payload(&record.encrypted_payload)
            .map_err(|e| CredError::Decryption(e.to_string()))?;

        // 3. open, bound to this key
        let plaintext = self
            .protector
            .unprotect(&sealed, &vault::associated_data(key.context(), key.user_name()))?;
        let secret = std::str::from_utf8(&plaintext)
            .map_err(|_| CredError::Decryption("secret is not valid UTF-8".to_string()))?;

        debug!(context = key.context(), user_name = key.user_name(), "credential loaded");
        Ok(Credential::new(key.user_name(), Zeroizing::new(secret.to_string())))
    }

    /// Whether a record exists for `key`
    pub fn exists(&self, key: &RecordKey) -> bool {
        layout::record_path(&self.root, key).is_file()
    }

    /// Saved keys, all contexts or only `context`
    pub fn list(&self, context: Option<&str>) -> CredResult<Vec<RecordKey>> {
        layout::scan(&self.root, context)
    }

    /// Remove the record saved under `key`
    ///
    /// A missing record is a warning, not an error.
    pub fn delete(
        &self,
        key: &RecordKey,
        prompter: &mut dyn Prompter,
        skip_confirmation: bool,
    ) -> CredResult<DeleteOutcome> {
        let path = layout::record_path(&self.root, key);
        if !path.is_file() {
            warn!(
                context = key.context(),
                user_name = key.user_name(),
                "no saved credential to delete"
            );
            return Ok(DeleteOutcome::Missing);
        }

        if !skip_confirmation
            && !prompter.confirm(&format!("Remove saved credential {}?", key))?
        {
            info!(context = key.context(), user_name = key.user_name(), "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        fs::remove_file(&path)?;
        layout::prune_empty_parents(&self.root, &path)?;

        info!(path = %path.display(), "credential removed");
        Ok(DeleteOutcome::Removed)
    }

    /// Remove the entire store: every context, every user
    ///
    /// Does nothing unless `all` is set. A root holding anything besides
    /// context directories and record files is refused with
    /// [`CredError::NotAStore`] and left untouched.
    pub fn delete_all(
        &self,
        all: bool,
        prompter: &mut dyn Prompter,
        skip_confirmation: bool,
    ) -> CredResult<DeleteOutcome> {
        if !all {
            warn!("refusing to remove every saved credential without the explicit 'all' flag");
            return Ok(DeleteOutcome::NotConfirmed);
        }

        if !self.root.exists() {
            warn!(root = %self.root.display(), "credential store does not exist, nothing to remove");
            return Ok(DeleteOutcome::Missing);
        }

        if !layout::is_store_root(&self.root)? {
            warn!(
                root = %self.root.display(),
                "refusing to remove a directory that is not a credential store"
            );
            return Err(CredError::NotAStore(self.root.display().to_string()));
        }

        if !skip_confirmation
            && !prompter.confirm(&format!(
                "Remove ALL saved credentials under {}: ENTIRE STORE REMOVED. Continue?",
                self.root.display()
            ))?
        {
            info!("delete all declined");
            return Ok(DeleteOutcome::Declined);
        }

        fs::remove_dir_all(&self.root)?;

        warn!(root = %self.root.display(), "all saved credentials removed");
        Ok(DeleteOutcome::Removed)
    }

    fn write(&self, key: &RecordKey, credential: &Credential) -> CredResult<PathBuf> {
        let path = layout::record_path(&self.root, key);

        // 1. seal, bound to this key
        let sealed = self.protector.protect(
            credential.secret().as_bytes(),
            &vault::associated_data(key.context(), key.user_name()),
        )?;

        // 2. context (and domain) directories
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // 3. atomic write
        vault::write_record(&path, &RecordFile::new(key.context(), key.user_name(), &sealed))?;

        debug!(path = %path.display(), "credential written");
        info!(context = key.context(), user_name = key.user_name(), "credential saved");
        Ok(path)
    }

    fn read_record(&self, key: &RecordKey) -> CredResult<SecretRecord> {
        let path = layout::record_path(&self.root, key);
        let file = match vault::read_record(&path) {
            Ok(file) => file,
            // 1. nothing saved under this key
            Err(VaultError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(CredError::not_found(key.context(), key.user_name()));
            }
            // 2. a file is there but it is not a record we can read
            Err(e @ (VaultError::Serialization(_) | VaultError::InvalidFormat(_))) => {
                return Err(CredError::Decryption(format!(
                    "{} is not a credential record: {}",
                    path.display(),
                    e
                )));
            }
            // 3. anything else is a plain I/O problem
            Err(e) => return Err(e.into()),
        };

        Ok(SecretRecord {
            key: key.clone(),
            encrypted_payload: file.payload,
            saved_at: file.saved_at,
        })
    }
}
