//! Durable per-provider consent flags.
//!
//! Records whether the user has completed the one-time terms-agreement step
//! for a provider. Flags are set exactly once when the consent screen is
//! completed and survive process restarts; nothing in the client ever unsets
//! them (account deletion is a backend concern).

use credential_store::{ProviderKind, StorageError, StorageResult};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Durable boolean-per-provider consent ledger.
///
/// Backed by a small JSON file; writes are flushed before the call returns.
pub struct ConsentLedger {
    path: Option<PathBuf>,
    flags: Mutex<HashMap<String, bool>>,
}

impl ConsentLedger {
    /// Open (or create) a ledger file at the given path.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let flags = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)
                .map_err(|e| StorageError::Encoding(format!("corrupt consent file: {}", e)))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: Some(path),
            flags: Mutex::new(flags),
        })
    }

    /// Create a volatile ledger. Useful for testing.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            flags: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the user has agreed to the terms for this provider.
    ///
    /// A missing flag means consent has not been given.
    pub fn is_agreed(&self, provider: ProviderKind) -> StorageResult<bool> {
        let flags = self.flags.lock().unwrap();
        Ok(flags.get(provider.as_str()).copied().unwrap_or(false))
    }

    /// Record consent for this provider. Idempotent.
    pub fn set_agreed(&self, provider: ProviderKind) -> StorageResult<()> {
        let mut flags = self.flags.lock().unwrap();
        let previous = flags.insert(provider.as_str().to_string(), true);
        if previous != Some(true) {
            tracing::info!(provider = %provider, "terms consent recorded");
        }
        self.persist(&flags)
    }

    fn persist(&self, flags: &HashMap<String, bool>) -> StorageResult<()> {
        let path = match &self.path {
            Some(p) => p,
            None => return Ok(()),
        };

        let content =
            serde_json::to_string_pretty(flags).map_err(|e| StorageError::Encoding(e.to_string()))?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
