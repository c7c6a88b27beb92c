//! Storage trait definitions.

use crate::StorageResult;

/// Trait for credential storage backends.
///
/// Reading a missing key is a normal result (`Ok(None)`), never an error.
/// A completed `set` must be visible to every subsequent `get` in the
/// process before the call returns.
pub trait CredentialStorage: Send + Sync {
    /// Store a value durably
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Retrieve a value
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value, returning whether it existed
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
