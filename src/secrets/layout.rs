//! On-disk layout
//!
//! ```text
//! <root>/<context>/<user>.cred
//! <root>/<context>/<DOMAIN>/<user>.cred
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{CredError, CredResult};
use crate::models::{RecordKey, DOMAIN_SEPARATOR};

/// Record file extension
pub const RECORD_EXTENSION: &str = "cred";

/// Characters that are not allowed in any path component
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

fn validate_component(kind: &str, value: &str) -> CredResult<()> {
    if value.trim().is_empty() {
        return Err(CredError::InvalidName(format!("{} must not be empty", kind)));
    }
    if value == "." || value == ".." {
        return Err(CredError::InvalidName(format!("{} must not be '{}'", kind, value)));
    }
    if let Some(c) = value
        .chars()
        .find(|c| c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(CredError::InvalidName(format!(
            "{} '{}' contains forbidden character {:?}",
            kind, value, c
        )));
    }
    Ok(())
}

/// Check that every component of `key` can be used as a path segment
pub fn validate_key(key: &RecordKey) -> CredResult<()> {
    validate_component("context", key.context())?;
    match key.user_name().split_once(DOMAIN_SEPARATOR) {
        Some((domain, account)) => {
            validate_component("domain", domain)?;
            // a domain directory must not shadow a plain user's record file
            if is_record_file_name(domain) {
                return Err(CredError::InvalidName(format!(
                    "domain '{}' must not end in '.{}'",
                    domain, RECORD_EXTENSION
                )));
            }
            validate_component("user name", account)
        }
        None => validate_component("user name", key.user_name()),
    }
}

fn is_record_file_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(RECORD_EXTENSION))
}

pub fn context_dir(root: &Path, context: &str) -> PathBuf {
    root.join(context)
}

/// Path of the record file for `key`
pub fn record_path(root: &Path, key: &RecordKey) -> PathBuf {
    let mut path = context_dir(root, key.context());
    if let Some(domain) = key.domain() {
        path.push(domain);
    }
    path.push(format!("{}.{}", key.account(), RECORD_EXTENSION));
    path
}

/// Remove the domain and context directories above `record` once they are empty
pub fn prune_empty_parents(root: &Path, record: &Path) -> CredResult<()> {
    let mut current = record.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        if fs::read_dir(dir)?.next().is_some() {
            break;
        }
        fs::remove_dir(dir)?;
        debug!(path = %dir.display(), "removed empty directory");
        current = dir.parent();
    }
    Ok(())
}

/// Find every saved key under `root`, optionally limited to one context
pub fn scan(root: &Path, context: Option<&str>) -> CredResult<Vec<RecordKey>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut keys = Vec::new();
    for entry in WalkDir::new(root).min_depth(2).max_depth(3) {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();

        // 1. record files only, temp files and strays are skipped
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION)
        {
            continue;
        }

        // 2. parent directories give the context and optional domain
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let parts: Vec<&str> = relative
            .parent()
            .into_iter()
            .flat_map(|p| p.iter())
            .filter_map(|c| c.to_str())
            .collect();
        let Some(account) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let (ctx, user_name) = match parts.as_slice() {
            [ctx] => (*ctx, account.to_string()),
            [ctx, domain] => (*ctx, format!("{}{}{}", domain, DOMAIN_SEPARATOR, account)),
            _ => continue,
        };
        if context.is_some_and(|wanted| wanted != ctx) {
            continue;
        }

        // 3. names that could not have been saved are not records
        match RecordKey::new(ctx, user_name) {
            Ok(key) => keys.push(key),
            Err(e) => debug!(path = %path.display(), error = %e, "skipping unrecognized file"),
        }
    }

    keys.sort();
    Ok(keys)
}

fn is_store_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    is_record_file_name(name) || name.ends_with(&format!(".{}.tmp", RECORD_EXTENSION))
}

/// Whether `root` holds nothing but credential records
///
/// Allowed shape: context directories at depth 1, record files or domain
/// directories at depth 2, record files at depth 3. Leftover temp files count
/// as records; empty directories are fine.
pub fn is_store_root(root: &Path) -> CredResult<bool> {
    if !root.is_dir() {
        return Ok(false);
    }

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let file_type = entry.file_type();
        let allowed = match entry.depth() {
            1 => file_type.is_dir(),
            2 => file_type.is_dir() || (file_type.is_file() && is_store_file(entry.path())),
            3 => file_type.is_file() && is_store_file(entry.path()),
            _ => false,
        };
        if !allowed {
            debug!(path = %entry.path().display(), "not a credential store entry");
            return Ok(false);
        }
    }
    Ok(true)
}
