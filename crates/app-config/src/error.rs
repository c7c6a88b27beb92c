//! Error types for configuration and paths.

use thiserror::Error;

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Filesystem path could not be resolved
    #[error("path error: {0}")]
    Path(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
