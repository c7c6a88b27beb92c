//! Identity provider gateway contract.

use crate::SessionResult;
use async_trait::async_trait;
use credential_store::ProviderKind;

/// Outcome of validating a previously stored provider credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSessionStatus {
    /// The provider still accepts the stored credential.
    Valid,
    /// The provider rejected the stored credential.
    Invalid,
    /// The provider could not be reached; the outcome is ambiguous.
    Unreachable,
}

/// Provider-issued identity proof consumed by the backend exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityProof {
    Kakao {
        access_token: String,
    },
    Apple {
        user_id: String,
        identity_token: String,
        authorization_code: String,
    },
}

impl IdentityProof {
    /// The provider that issued this proof.
    pub fn provider(&self) -> ProviderKind {
        match self {
            IdentityProof::Kakao { .. } => ProviderKind::Kakao,
            IdentityProof::Apple { .. } => ProviderKind::Apple,
        }
    }
}

/// Fresh credential material returned by a provider login.
///
/// For Apple, `access_token` holds the identity token and no refresh token
/// is issued to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub proof: IdentityProof,
}

impl ProviderCredential {
    /// The provider that issued this credential.
    pub fn provider(&self) -> ProviderKind {
        self.proof.provider()
    }
}

/// Outcome of an interactive provider login.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Login finished with a fresh credential.
    Credential(ProviderCredential),
    /// The user abandoned the login flow.
    Cancelled,
    /// The provider rejected the login.
    Failed(String),
}

/// Abstraction over third-party login providers.
#[async_trait]
pub trait IdentityProviderGateway: Send + Sync {
    /// The provider variant this gateway speaks for.
    fn kind(&self) -> ProviderKind;

    /// Check whether a previously stored credential is still accepted by the
    /// provider. Must not mutate local state.
    async fn validate_session(&self, credential: &str) -> SessionResult<ProviderSessionStatus>;

    /// Drive the provider's login flow and return fresh credential material.
    ///
    /// Cancellation, provider-side rejection, and network failure are all
    /// distinguishable to the caller.
    async fn authenticate(&self) -> SessionResult<LoginOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_provider() {
        let kakao = IdentityProof::Kakao {
            access_token: "t".to_string(),
        };
        assert_eq!(kakao.provider(), ProviderKind::Kakao);

        let apple = IdentityProof::Apple {
            user_id: "u".to_string(),
            identity_token: "jwt".to_string(),
            authorization_code: "c".to_string(),
        };
        assert_eq!(apple.provider(), ProviderKind::Apple);
    }
}
