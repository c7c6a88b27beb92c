//! Provider/token identity and the storage key scheme.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity provider used to establish the signed-in identity.
///
/// Exactly one provider is signed in at a time; login clears the other
/// provider's tokens before persisting its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Kakao,
    Apple,
}

impl ProviderKind {
    /// All providers, in reconciliation precedence order: when both variants
    /// somehow have stored credentials, Kakao is checked first.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Kakao, ProviderKind::Apple];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Kakao => "kakao",
            ProviderKind::Apple => "apple",
        }
    }

    /// The other provider variant.
    pub fn other(&self) -> ProviderKind {
        match self {
            ProviderKind::Kakao => ProviderKind::Apple,
            ProviderKind::Apple => ProviderKind::Kakao,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of token stored under a provider.
///
/// For Apple, `ProviderAccess` holds the identity token; Apple issues no
/// provider refresh token to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Token issued by the identity provider for API access
    ProviderAccess,
    /// Refresh token issued by the identity provider
    ProviderRefresh,
    /// Access token issued by our backend
    BackendAccess,
    /// Refresh token issued by our backend
    BackendRefresh,
}

impl TokenKind {
    pub const ALL: [TokenKind; 4] = [
        TokenKind::ProviderAccess,
        TokenKind::ProviderRefresh,
        TokenKind::BackendAccess,
        TokenKind::BackendRefresh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::ProviderAccess => "provider_access",
            TokenKind::ProviderRefresh => "provider_refresh",
            TokenKind::BackendAccess => "backend_access",
            TokenKind::BackendRefresh => "backend_refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage keys used by the client core.
pub struct StorageKeys;

impl StorageKeys {
    /// Account snapshot persisted at login (JSON)
    pub const ACCOUNT_RECORD: &'static str = "account_record";

    /// Composite key for a (provider, kind) token slot.
    pub fn token(provider: ProviderKind, kind: TokenKind) -> String {
        format!("{}.{}", provider.as_str(), kind.as_str())
    }
}
