//! Backend auth API gateway.
//!
//! All operations are single-shot network calls with no internal retry; the
//! caller owns retry policy. Response bodies may carry tokens, so failures
//! log a length/digest summary instead of the body itself.

use crate::provider::IdentityProof;
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, info, warn};

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Account profile returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub member_id: String,
    pub nickname: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// Backend session established by a provider-credential exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSession {
    pub access_token: String,
    pub refresh_token: String,
    pub profile: ProfileInfo,
}

/// Abstraction over the backend auth API.
#[async_trait]
pub trait BackendSessionGateway: Send + Sync {
    /// Exchange a validated provider identity proof for a backend session.
    async fn exchange_provider_credential(
        &self,
        proof: &IdentityProof,
    ) -> SessionResult<BackendSession>;

    /// Exchange a backend refresh token for a new access token.
    ///
    /// `RefreshExpired` means the refresh token itself is no longer valid
    /// and must not be retried.
    async fn refresh(&self, refresh_token: &str) -> SessionResult<String>;

    /// Fetch the account profile for a backend access token.
    async fn fetch_profile(&self, access_token: &str) -> SessionResult<ProfileInfo>;
}

#[derive(Debug, Serialize)]
struct KakaoLoginRequest<'a> {
    access_token: &'a str,
}

#[derive(Debug, Serialize)]
struct AppleLoginRequest<'a> {
    user_id: &'a str,
    identity_token: &'a str,
    authorization_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshTokenInfo {
    token: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token_info: RefreshTokenInfo,
    member: ProfileInfo,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// HTTP implementation of the backend auth API.
#[derive(Clone)]
pub struct HttpBackendGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackendGateway {
    /// Create a new gateway.
    ///
    /// # Arguments
    /// * `base_url` - The backend API base URL (e.g., `https://api.keepin.app`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BackendSessionGateway for HttpBackendGateway {
    async fn exchange_provider_credential(
        &self,
        proof: &IdentityProof,
    ) -> SessionResult<BackendSession> {
        let request = match proof {
            IdentityProof::Kakao { access_token } => self
                .http
                .post(self.endpoint("/auth/login/kakao"))
                .json(&KakaoLoginRequest { access_token }),
            IdentityProof::Apple {
                user_id,
                identity_token,
                authorization_code,
            } => self
                .http
                .post(self.endpoint("/auth/login/apple"))
                .json(&AppleLoginRequest {
                    user_id,
                    identity_token,
                    authorization_code,
                }),
        };

        debug!(provider = %proof.provider(), "exchanging provider credential");

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            warn!(status = %status, body_summary = %body_summary, "provider credential exchange failed");
            return Err(SessionError::Backend(format!(
                "login rejected: HTTP {} ({})",
                status, body_summary
            )));
        }

        let data: LoginResponse = response.json().await?;

        info!(member_id = %data.member.member_id, "backend session established");

        Ok(BackendSession {
            access_token: data.access_token,
            refresh_token: data.refresh_token_info.token,
            profile: data.member,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> SessionResult<String> {
        let url = self.endpoint("/auth/refresh");

        debug!(url = %url, "refreshing backend access token");

        let response = self
            .http
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            info!(status = %status, "backend refresh token no longer valid");
            return Err(SessionError::RefreshExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            warn!(status = %status, body_summary = %body_summary, "token refresh failed");
            return Err(SessionError::Transport(format!(
                "refresh failed: HTTP {} ({})",
                status, body_summary
            )));
        }

        let data: RefreshResponse = response.json().await?;

        info!("backend access token refreshed");

        Ok(data.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> SessionResult<ProfileInfo> {
        let url = self.endpoint("/members/me");

        debug!(url = %url, "fetching account profile");

        let response = self.http.get(&url).bearer_auth(access_token).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            warn!(status = %status, body_summary = %body_summary, "profile fetch failed");
            return Err(SessionError::Backend(format!(
                "profile fetch rejected: HTTP {} ({})",
                status, body_summary
            )));
        }

        Ok(response.json().await?)
    }
}
