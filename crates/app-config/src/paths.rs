//! File system paths for the client core.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Manages file system paths for the client core.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.keepin)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.keepin`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".keepin"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.keepin).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.keepin/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the credential storage path (~/.keepin/credentials.json).
    pub fn credentials_file(&self) -> PathBuf {
        self.base_dir.join("credentials.json")
    }

    /// Get the consent ledger path (~/.keepin/consent.json).
    pub fn consent_file(&self) -> PathBuf {
        self.base_dir.join("consent.json")
    }

    /// Ensure the base directory exists.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_base_dir() {
        let paths = Paths::with_base_dir(PathBuf::from("/tmp/keepin-test"));

        assert!(paths.config_file().starts_with(paths.base_dir()));
        assert!(paths.credentials_file().starts_with(paths.base_dir()));
        assert!(paths.consent_file().starts_with(paths.base_dir()));
    }

    #[test]
    fn test_ensure_dirs_creates_base() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested"));

        paths.ensure_dirs().unwrap();
        assert!(paths.base_dir().exists());
    }
}
