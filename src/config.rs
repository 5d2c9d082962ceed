//! Store configuration
//!
//! Values come from the environment (a `.env` file is loaded first when present):
//! - `CREDCACHE_HOME`: store root, default `~/.credcache`
//! - `CREDCACHE_CONTEXT`: default context, default `default`
//! - `CREDCACHE_KEYCHAIN_SERVICE`: keychain service holding the master key, default `credcache`

use std::path::PathBuf;

use crate::error::{CredError, CredResult};

pub const ENV_HOME: &str = "CREDCACHE_HOME";
pub const ENV_CONTEXT: &str = "CREDCACHE_CONTEXT";
pub const ENV_KEYCHAIN_SERVICE: &str = "CREDCACHE_KEYCHAIN_SERVICE";

/// Store directory created under the user's home directory
pub const STORE_DIR_NAME: &str = ".credcache";
pub const DEFAULT_CONTEXT: &str = "default";
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "credcache";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub root: PathBuf,
    pub default_context: String,
    pub keychain_service: String,
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_context: DEFAULT_CONTEXT.to_string(),
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }

    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> CredResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CredResult<Self> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let root = match lookup(ENV_HOME) {
            Some(root) => PathBuf::from(root),
            None => dirs::home_dir()
                .map(|home| home.join(STORE_DIR_NAME))
                .ok_or_else(|| {
                    CredError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("home directory not found; set {}", ENV_HOME),
                    ))
                })?,
        };

        let mut config = Self::new(root);
        if let Some(context) = lookup(ENV_CONTEXT) {
            config.default_context = context;
        }
        if let Some(service) = lookup(ENV_KEYCHAIN_SERVICE) {
            config.keychain_service = service;
        }
        Ok(config)
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}
