//! Durable credential storage for the keepin client core.
//!
//! This crate owns every piece of persisted credential material:
//! identity-provider tokens, backend session tokens, and the account snapshot
//! written at login time. Storage backends implement [`CredentialStorage`];
//! the crate ships a JSON-file backend for the device and an in-memory
//! backend for tests. Mobile shells plug their platform keychain behind the
//! same trait.

mod file;
mod keys;
mod memory;
mod store;
mod traits;

pub use file::FileStorage;
pub use keys::{ProviderKind, StorageKeys, TokenKind};
pub use memory::MemoryStorage;
pub use store::{AccountRecord, TokenStore};
pub use traits::CredentialStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage failure
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
