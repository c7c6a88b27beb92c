//! Kakao identity provider gateway.

use crate::callback::{CallbackServer, DEFAULT_CALLBACK_TIMEOUT_SECS};
use crate::provider::{
    IdentityProof, IdentityProviderGateway, LoginOutcome, ProviderCredential,
    ProviderSessionStatus,
};
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use credential_store::ProviderKind;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

/// Kakao OAuth endpoint base.
pub const KAKAO_AUTH_BASE: &str = "https://kauth.kakao.com";
/// Kakao API endpoint base.
pub const KAKAO_API_BASE: &str = "https://kapi.kakao.com";

/// Token response from the Kakao OAuth token endpoint.
#[derive(Debug, Deserialize)]
struct KakaoTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Gateway for Kakao login.
pub struct KakaoGateway {
    http: reqwest::Client,
    app_key: String,
    auth_base: String,
    api_base: String,
    callback_port: u16,
    callback_timeout_secs: u64,
}

impl KakaoGateway {
    /// Create a gateway against the production Kakao endpoints.
    pub fn new(app_key: impl Into<String>, callback_port: u16) -> Self {
        Self::with_endpoints(app_key, KAKAO_AUTH_BASE, KAKAO_API_BASE, callback_port)
    }

    /// Create a gateway with custom endpoints.
    pub fn with_endpoints(
        app_key: impl Into<String>,
        auth_base: impl Into<String>,
        api_base: impl Into<String>,
        callback_port: u16,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            app_key: app_key.into(),
            auth_base: auth_base.into(),
            api_base: api_base.into(),
            callback_port,
            callback_timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
        }
    }

    /// The authorize URL the user's browser must visit to sign in.
    pub fn authorize_url(&self) -> SessionResult<String> {
        let redirect = CallbackServer::new(self.callback_port, self.callback_timeout_secs)
            .redirect_uri();
        let mut url = Url::parse(&format!("{}/oauth/authorize", self.auth_base))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.app_key)
            .append_pair("redirect_uri", &redirect)
            .append_pair("response_type", "code");
        Ok(url.into())
    }

    /// Exchange an authorization code for Kakao tokens.
    async fn exchange_code(&self, code: &str) -> SessionResult<KakaoTokenResponse> {
        let token_url = format!("{}/oauth/token", self.auth_base);
        let redirect = CallbackServer::new(self.callback_port, self.callback_timeout_secs)
            .redirect_uri();

        debug!(url = %token_url, "exchanging Kakao authorization code");

        let response = self
            .http
            .post(&token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", &self.app_key),
                ("redirect_uri", &redirect),
                ("code", code),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "Kakao token exchange failed");
            return Err(SessionError::InvalidCredential(format!(
                "Kakao token exchange rejected: HTTP {}",
                status
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProviderGateway for KakaoGateway {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Kakao
    }

    /// Check the stored access token against the Kakao token-info endpoint.
    async fn validate_session(&self, credential: &str) -> SessionResult<ProviderSessionStatus> {
        let url = format!("{}/v1/user/access_token_info", self.api_base);

        debug!(url = %url, "validating Kakao access token");

        match self.http.get(&url).bearer_auth(credential).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Kakao access token valid");
                Ok(ProviderSessionStatus::Valid)
            }
            Ok(response)
                if response.status() == StatusCode::UNAUTHORIZED
                    || response.status() == StatusCode::BAD_REQUEST =>
            {
                info!(status = %response.status(), "Kakao rejected stored access token");
                Ok(ProviderSessionStatus::Invalid)
            }
            Ok(response) => {
                warn!(status = %response.status(), "unexpected Kakao response during validation");
                Ok(ProviderSessionStatus::Unreachable)
            }
            Err(e) => {
                warn!(error = %e, "Kakao unreachable during validation");
                Ok(ProviderSessionStatus::Unreachable)
            }
        }
    }

    /// Drive the browser OAuth flow: wait for the redirect on the local
    /// callback listener, then exchange the authorization code for tokens.
    async fn authenticate(&self) -> SessionResult<LoginOutcome> {
        let server = CallbackServer::new(self.callback_port, self.callback_timeout_secs);
        let authorize = self.authorize_url()?;
        info!(url = %authorize, "open this URL in a browser to sign in with Kakao");

        let hit = match server.wait_for_redirect().await {
            Ok(hit) => hit,
            Err(SessionError::Timeout) => {
                info!("Kakao sign-in abandoned (timeout)");
                return Ok(LoginOutcome::Cancelled);
            }
            Err(e) => return Err(e),
        };

        if let Some(error) = hit.get("error") {
            return Ok(match error {
                "access_denied" => LoginOutcome::Cancelled,
                other => LoginOutcome::Failed(format!("Kakao sign-in error: {}", other)),
            });
        }

        let code = match hit.get("code") {
            Some(code) => code.to_string(),
            None => {
                return Ok(LoginOutcome::Failed(
                    "redirect missing authorization code".to_string(),
                ))
            }
        };

        let tokens = match self.exchange_code(&code).await {
            Ok(tokens) => tokens,
            Err(SessionError::InvalidCredential(reason)) => {
                return Ok(LoginOutcome::Failed(reason))
            }
            Err(e) => return Err(e),
        };

        info!("Kakao sign-in complete");

        Ok(LoginOutcome::Credential(ProviderCredential {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token,
            proof: IdentityProof::Kakao {
                access_token: tokens.access_token,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_app_key_and_redirect() {
        let gateway = KakaoGateway::new("test-app-key", 9412);
        let url = gateway.authorize_url().unwrap();

        assert!(url.starts_with("https://kauth.kakao.com/oauth/authorize?"));
        assert!(url.contains("client_id=test-app-key"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A9412%2Fcallback"));
    }

    #[test]
    fn test_token_response_shape() {
        let json = r#"{
            "token_type": "bearer",
            "access_token": "kakao-at",
            "refresh_token": "kakao-rt",
            "expires_in": 21599
        }"#;
        let parsed: KakaoTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "kakao-at");
        assert_eq!(parsed.refresh_token.as_deref(), Some("kakao-rt"));
    }

    #[test]
    fn test_token_response_without_refresh_token() {
        let json = r#"{"access_token": "kakao-at"}"#;
        let parsed: KakaoTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.refresh_token, None);
    }

    #[test]
    fn test_gateway_kind() {
        let gateway = KakaoGateway::new("k", 9412);
        assert_eq!(gateway.kind(), ProviderKind::Kakao);
    }
}
