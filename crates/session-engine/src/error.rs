//! Session and authentication error types.

use credential_store::StorageError;
use thiserror::Error;

/// Error type for session and authentication operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// User abandoned a provider login. Not a failure; no state is mutated.
    #[error("login cancelled")]
    Cancelled,

    /// Provider rejected a credential
    #[error("provider rejected credential: {0}")]
    InvalidCredential(String),

    /// Network-layer failure with an ambiguous outcome
    #[error("network transport failure: {0}")]
    Transport(String),

    /// Backend refresh token is no longer valid and must not be retried
    #[error("refresh token no longer valid")]
    RefreshExpired,

    /// Backend rejected an exchange or profile request
    #[error("backend request failed: {0}")]
    Backend(String),

    /// No signed-in account for an operation that requires one
    #[error("no signed-in account")]
    NotAuthenticated,

    /// Invalid transition in the phase machine
    #[error("invalid phase transition: {0}")]
    InvalidTransition(String),

    /// Gateway configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation timed out
    #[error("operation timed out")]
    Timeout,
}

impl SessionError {
    /// Returns true if this error is transient and the operation can be
    /// retried: connection failures, timeouts, and 5xx server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            SessionError::Transport(_) => true,
            SessionError::Timeout => true,
            SessionError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_is_transient() {
        assert!(SessionError::Transport("connection reset".to_string()).is_transient());
    }

    #[test]
    fn test_timeout_is_transient() {
        assert!(SessionError::Timeout.is_transient());
    }

    #[test]
    fn test_cancelled_is_not_transient() {
        assert!(!SessionError::Cancelled.is_transient());
    }

    #[test]
    fn test_refresh_expired_is_not_transient() {
        assert!(!SessionError::RefreshExpired.is_transient());
    }

    #[test]
    fn test_invalid_credential_is_not_transient() {
        assert!(!SessionError::InvalidCredential("revoked".to_string()).is_transient());
    }

    #[test]
    fn test_backend_failure_is_not_transient() {
        assert!(!SessionError::Backend("409".to_string()).is_transient());
    }
}
