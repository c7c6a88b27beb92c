//! Apple identity provider gateway.
//!
//! Apple hands the client an identity token (a JWT) at sign-in and offers no
//! endpoint for re-validating it later, so session validation is a local
//! check of the token's expiry claim. This mirrors how the mobile shells
//! treat a cached Sign in with Apple credential.

use crate::callback::{CallbackServer, DEFAULT_CALLBACK_TIMEOUT_SECS};
use crate::provider::{
    IdentityProof, IdentityProviderGateway, LoginOutcome, ProviderCredential,
    ProviderSessionStatus,
};
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use credential_store::ProviderKind;
use tracing::{debug, info};
use url::Url;

/// Apple sign-in endpoint base.
pub const APPLE_AUTH_BASE: &str = "https://appleid.apple.com";

/// Gateway for Sign in with Apple.
pub struct AppleGateway {
    client_id: String,
    auth_base: String,
    callback_port: u16,
    callback_timeout_secs: u64,
}

impl AppleGateway {
    /// Create a gateway against the production Apple endpoints.
    pub fn new(client_id: impl Into<String>, callback_port: u16) -> Self {
        Self::with_endpoints(client_id, APPLE_AUTH_BASE, callback_port)
    }

    /// Create a gateway with a custom endpoint.
    pub fn with_endpoints(
        client_id: impl Into<String>,
        auth_base: impl Into<String>,
        callback_port: u16,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            auth_base: auth_base.into(),
            callback_port,
            callback_timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
        }
    }

    /// The authorize URL the user's browser must visit to sign in.
    pub fn authorize_url(&self) -> SessionResult<String> {
        let redirect = CallbackServer::new(self.callback_port, self.callback_timeout_secs)
            .redirect_uri();
        let mut url = Url::parse(&format!("{}/auth/authorize", self.auth_base))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &redirect)
            .append_pair("response_type", "code id_token")
            .append_pair("response_mode", "query")
            .append_pair("scope", "name");
        Ok(url.into())
    }
}

/// Decode the payload of a JWT without verifying its signature.
///
/// Signature verification belongs to the backend exchange; the client only
/// reads claims it already trusts the provider to have issued.
fn decode_payload(token: &str) -> Option<serde_json::Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Read the expiry claim from an identity token.
fn token_expiry(token: &str) -> Option<i64> {
    decode_payload(token)?.get("exp")?.as_i64()
}

/// Read the subject claim from an identity token.
fn token_subject(token: &str) -> Option<String> {
    Some(decode_payload(token)?.get("sub")?.as_str()?.to_string())
}

#[async_trait]
impl IdentityProviderGateway for AppleGateway {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Apple
    }

    /// Validate the stored identity token locally by its expiry claim.
    async fn validate_session(&self, credential: &str) -> SessionResult<ProviderSessionStatus> {
        match token_expiry(credential) {
            Some(exp) if exp > chrono::Utc::now().timestamp() => {
                debug!("Apple identity token unexpired");
                Ok(ProviderSessionStatus::Valid)
            }
            Some(_) => {
                info!("Apple identity token expired");
                Ok(ProviderSessionStatus::Invalid)
            }
            None => {
                info!("stored Apple identity token is malformed");
                Ok(ProviderSessionStatus::Invalid)
            }
        }
    }

    /// Drive the browser sign-in flow and collect the identity token and
    /// authorization code from the redirect.
    async fn authenticate(&self) -> SessionResult<LoginOutcome> {
        let server = CallbackServer::new(self.callback_port, self.callback_timeout_secs);
        let authorize = self.authorize_url()?;
        info!(url = %authorize, "open this URL in a browser to sign in with Apple");

        let hit = match server.wait_for_redirect().await {
            Ok(hit) => hit,
            Err(SessionError::Timeout) => {
                info!("Apple sign-in abandoned (timeout)");
                return Ok(LoginOutcome::Cancelled);
            }
            Err(e) => return Err(e),
        };

        if let Some(error) = hit.get("error") {
            return Ok(match error {
                "user_cancelled_authorize" => LoginOutcome::Cancelled,
                other => LoginOutcome::Failed(format!("Apple sign-in error: {}", other)),
            });
        }

        let identity_token = match hit.get("id_token") {
            Some(token) => token.to_string(),
            None => {
                return Ok(LoginOutcome::Failed(
                    "redirect missing identity token".to_string(),
                ))
            }
        };
        let authorization_code = match hit.get("code") {
            Some(code) => code.to_string(),
            None => {
                return Ok(LoginOutcome::Failed(
                    "redirect missing authorization code".to_string(),
                ))
            }
        };
        let user_id = match token_subject(&identity_token) {
            Some(sub) => sub,
            None => {
                return Ok(LoginOutcome::Failed(
                    "identity token has no subject claim".to_string(),
                ))
            }
        };

        info!("Apple sign-in complete");

        Ok(LoginOutcome::Credential(ProviderCredential {
            access_token: identity_token.clone(),
            refresh_token: None,
            proof: IdentityProof::Apple {
                user_id,
                identity_token,
                authorization_code,
            },
        }))
    }
}
