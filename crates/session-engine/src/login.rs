//! Login flow orchestration.
//!
//! Drives the provider sign-in → backend exchange → session installation
//! sequence the UI's login screen triggers. Failures surface typed to the
//! caller for user-visible messaging; cancellation mutates no state.

use crate::account::Account;
use crate::backend::BackendSessionGateway;
use crate::controller::SessionController;
use crate::phase::ApplicationPhase;
use crate::provider::{IdentityProviderGateway, LoginOutcome, ProviderCredential};
use crate::{SessionError, SessionResult};
use credential_store::{ProviderKind, TokenKind, TokenStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a completed login.
#[derive(Debug, Clone)]
pub struct LoginReport {
    pub account: Account,
    pub phase: ApplicationPhase,
}

/// Drives a full login through a provider gateway and the backend.
pub struct LoginOrchestrator {
    controller: Arc<SessionController>,
    tokens: Arc<TokenStore>,
    providers: HashMap<ProviderKind, Arc<dyn IdentityProviderGateway>>,
    backend: Arc<dyn BackendSessionGateway>,
}

impl LoginOrchestrator {
    /// Create a new orchestrator sharing the controller's stores and gateways.
    pub fn new(
        controller: Arc<SessionController>,
        tokens: Arc<TokenStore>,
        providers: impl IntoIterator<Item = Arc<dyn IdentityProviderGateway>>,
        backend: Arc<dyn BackendSessionGateway>,
    ) -> Self {
        let providers = providers
            .into_iter()
            .map(|gateway| (gateway.kind(), gateway))
            .collect();

        Self {
            controller,
            tokens,
            providers,
            backend,
        }
    }

    /// Run the provider's interactive sign-in, then complete the login.
    pub async fn login(&self, provider: ProviderKind) -> SessionResult<LoginReport> {
        let gateway = self.providers.get(&provider).ok_or_else(|| {
            SessionError::Config(format!("no gateway registered for {}", provider))
        })?;

        let credential = match gateway.authenticate().await? {
            LoginOutcome::Credential(credential) => credential,
            LoginOutcome::Cancelled => {
                info!(provider = %provider, "login cancelled by user");
                return Err(SessionError::Cancelled);
            }
            LoginOutcome::Failed(reason) => {
                warn!(provider = %provider, reason = %reason, "provider login failed");
                return Err(SessionError::InvalidCredential(reason));
            }
        };

        self.login_with_credential(credential).await
    }

    /// Complete a login from credential material the embedding shell already
    /// obtained (e.g. from a platform login SDK).
    pub async fn login_with_credential(
        &self,
        credential: ProviderCredential,
    ) -> SessionResult<LoginReport> {
        let provider = credential.provider();

        // Persist the provider tokens before the backend exchange, matching
        // the order a retried exchange expects to find them in.
        self.tokens
            .set(provider, TokenKind::ProviderAccess, &credential.access_token)?;
        if let Some(refresh_token) = &credential.refresh_token {
            self.tokens
                .set(provider, TokenKind::ProviderRefresh, refresh_token)?;
        }

        let session = self
            .backend
            .exchange_provider_credential(&credential.proof)
            .await?;

        let account = Account {
            id: session.profile.member_id,
            display_name: session.profile.nickname,
            image_url: session.profile.profile_image_url,
            provider,
            access_token: session.access_token,
            refresh_token: Some(session.refresh_token),
        };

        let phase = self.controller.complete_login(account.clone())?;

        info!(provider = %provider, member_id = %account.id, "login flow complete");

        Ok(LoginReport { account, phase })
    }
}
