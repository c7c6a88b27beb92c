//! Scenario tests for session reconciliation and lifecycle.
//!
//! - `reconciliation.rs` - auto-login decision sequence on bootstrap
//! - `supersede.rs`      - generation-token discard of stale reconciliations
//! - `lifecycle.rs`      - login/consent/onboarding/logout phase walks
//! - `login_flow.rs`     - provider → backend → session login orchestration
//!
//! All scenarios run against scripted gateways and in-memory stores; no
//! network is involved.


use crate::backend::{BackendSession, BackendSessionGateway, ProfileInfo};
use crate::provider::{
    IdentityProviderGateway, LoginOutcome, ProviderCredential, ProviderSessionStatus,
};
use crate::{
    Account, IdentityProof, LoginOrchestrator, SessionController, SessionError, SessionResult,
};
use async_trait::async_trait;
use consent_store::ConsentLedger;
use credential_store::{AccountRecord, MemoryStorage, ProviderKind, TokenKind, TokenStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Provider gateway with a scripted validation result and login outcome.
pub(crate) struct ScriptedProvider {
    kind: ProviderKind,
    validity: ProviderSessionStatus,
    validate_calls: AtomicUsize,
    login_outcome: Mutex<Option<LoginOutcome>>,
}

impl ScriptedProvider {
    pub fn valid(kind: ProviderKind) -> Self {
        Self::with_validity(kind, ProviderSessionStatus::Valid)
    }

    pub fn invalid(kind: ProviderKind) -> Self {
        Self::with_validity(kind, ProviderSessionStatus::Invalid)
    }

    pub fn unreachable(kind: ProviderKind) -> Self {
        Self::with_validity(kind, ProviderSessionStatus::Unreachable)
    }

    pub fn with_validity(kind: ProviderKind, validity: ProviderSessionStatus) -> Self {
        Self {
            kind,
            validity,
            validate_calls: AtomicUsize::new(0),
            login_outcome: Mutex::new(None),
        }
    }

    pub fn with_login(kind: ProviderKind, outcome: LoginOutcome) -> Self {
        let provider = Self::valid(kind);
        *provider.login_outcome.lock().unwrap() = Some(outcome);
        provider
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProviderGateway for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn validate_session(&self, _credential: &str) -> SessionResult<ProviderSessionStatus> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.validity)
    }

    async fn authenticate(&self) -> SessionResult<LoginOutcome> {
        Ok(self
            .login_outcome
            .lock()
            .unwrap()
            .take()
            .unwrap_or(LoginOutcome::Failed("no scripted outcome".to_string())))
    }
}

/// Scripted reply for backend refresh calls.
#[derive(Debug, Clone)]
pub(crate) enum RefreshScript {
    Token(String),
    Expired,
    Unreachable,
}

/// Backend gateway with scripted replies and call counters.
pub(crate) struct ScriptedBackend {
    refresh_script: Mutex<RefreshScript>,
    refresh_calls: AtomicUsize,
    exchange_script: Mutex<Option<BackendSession>>,
    exchange_calls: AtomicUsize,
    profile_script: Mutex<Option<ProfileInfo>>,
    profile_calls: AtomicUsize,
    /// When set, `refresh` signals the first notify and then waits on the
    /// second before replying. Lets tests interleave explicit mutations with
    /// an in-flight reconciliation.
    refresh_barrier: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            refresh_script: Mutex::new(RefreshScript::Unreachable),
            refresh_calls: AtomicUsize::new(0),
            exchange_script: Mutex::new(None),
            exchange_calls: AtomicUsize::new(0),
            profile_script: Mutex::new(None),
            profile_calls: AtomicUsize::new(0),
            refresh_barrier: Mutex::new(None),
        }
    }
}

impl ScriptedBackend {
    pub fn with_refresh(self, script: RefreshScript) -> Self {
        *self.refresh_script.lock().unwrap() = script;
        self
    }

    pub fn with_exchange(self, session: BackendSession) -> Self {
        *self.exchange_script.lock().unwrap() = Some(session);
        self
    }

    pub fn set_refresh_barrier(&self, entered: Arc<Notify>, release: Arc<Notify>) {
        *self.refresh_barrier.lock().unwrap() = Some((entered, release));
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendSessionGateway for ScriptedBackend {
    async fn exchange_provider_credential(
        &self,
        _proof: &IdentityProof,
    ) -> SessionResult<BackendSession> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        match self.exchange_script.lock().unwrap().clone() {
            Some(session) => Ok(session),
            None => Err(SessionError::Backend("scripted exchange failure".to_string())),
        }
    }

    async fn refresh(&self, _refresh_token: &str) -> SessionResult<String> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        let barrier = self.refresh_barrier.lock().unwrap().clone();
        if let Some((entered, release)) = barrier {
            entered.notify_one();
            release.notified().await;
        }

        match self.refresh_script.lock().unwrap().clone() {
            RefreshScript::Token(token) => Ok(token),
            RefreshScript::Expired => Err(SessionError::RefreshExpired),
            RefreshScript::Unreachable => {
                Err(SessionError::Transport("scripted outage".to_string()))
            }
        }
    }

    async fn fetch_profile(&self, _access_token: &str) -> SessionResult<ProfileInfo> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        match self.profile_script.lock().unwrap().clone() {
            Some(profile) => Ok(profile),
            None => Err(SessionError::Backend("scripted profile failure".to_string())),
        }
    }
}

/// A controller wired to scripted gateways and in-memory stores.
pub(crate) struct Harness {
    pub tokens: Arc<TokenStore>,
    pub consent: Arc<ConsentLedger>,
    pub kakao: Arc<ScriptedProvider>,
    pub apple: Arc<ScriptedProvider>,
    pub backend: Arc<ScriptedBackend>,
    pub controller: Arc<SessionController>,
    pub orchestrator: LoginOrchestrator,
}

impl Harness {
    pub fn new(kakao: ScriptedProvider, apple: ScriptedProvider, backend: ScriptedBackend) -> Self {
        let tokens = Arc::new(TokenStore::new(Box::new(MemoryStorage::new())));
        let consent = Arc::new(ConsentLedger::in_memory());
        Self::with_stores(tokens, consent, kakao, apple, backend)
    }

    /// Build over existing stores; used to simulate a process restart.
    pub fn with_stores(
        tokens: Arc<TokenStore>,
        consent: Arc<ConsentLedger>,
        kakao: ScriptedProvider,
        apple: ScriptedProvider,
        backend: ScriptedBackend,
    ) -> Self {
        let kakao = Arc::new(kakao);
        let apple = Arc::new(apple);
        let backend = Arc::new(backend);

        let gateways: Vec<Arc<dyn IdentityProviderGateway>> =
            vec![kakao.clone(), apple.clone()];

        let controller = Arc::new(SessionController::new(
            tokens.clone(),
            consent.clone(),
            gateways.clone(),
            backend.clone(),
        ));

        let orchestrator = LoginOrchestrator::new(
            controller.clone(),
            tokens.clone(),
            gateways,
            backend.clone(),
        );

        Self {
            tokens,
            consent,
            kakao,
            apple,
            backend,
            controller,
            orchestrator,
        }
    }

    /// Store a provider credential plus the given backend token slots and an
    /// account snapshot, as a completed login would have left them.
    pub fn seed_session(
        &self,
        provider: ProviderKind,
        backend_access: Option<&str>,
        backend_refresh: Option<&str>,
    ) {
        self.tokens
            .set(provider, TokenKind::ProviderAccess, "stored-provider-token")
            .unwrap();
        if let Some(access) = backend_access {
            self.tokens
                .set(provider, TokenKind::BackendAccess, access)
                .unwrap();
        }
        if let Some(refresh) = backend_refresh {
            self.tokens
                .set(provider, TokenKind::BackendRefresh, refresh)
                .unwrap();
        }
        self.tokens.set_account(&sample_record(provider)).unwrap();
    }

    /// Assert that no token material or account snapshot remains stored.
    pub fn assert_storage_empty(&self) {
        for provider in ProviderKind::ALL {
            for kind in TokenKind::ALL {
                assert_eq!(
                    self.tokens.get(provider, kind).unwrap(),
                    None,
                    "expected {}/{} to be cleared",
                    provider,
                    kind
                );
            }
        }
        assert_eq!(self.tokens.get_account().unwrap(), None);
    }
}

pub(crate) fn sample_record(provider: ProviderKind) -> AccountRecord {
    AccountRecord {
        id: "member-1".to_string(),
        display_name: "Jin".to_string(),
        image_url: None,
        provider,
    }
}

pub(crate) fn sample_account(provider: ProviderKind) -> Account {
    Account {
        id: "member-1".to_string(),
        display_name: "Jin".to_string(),
        image_url: None,
        provider,
        access_token: "backend-at".to_string(),
        refresh_token: Some("backend-rt".to_string()),
    }
}

pub(crate) fn sample_backend_session() -> BackendSession {
    BackendSession {
        access_token: "exchanged-at".to_string(),
        refresh_token: "exchanged-rt".to_string(),
        profile: ProfileInfo {
            member_id: "member-9".to_string(),
            nickname: "Hana".to_string(),
            profile_image_url: None,
        },
    }
}

pub(crate) fn sample_credential(provider: ProviderKind) -> ProviderCredential {
    match provider {
        ProviderKind::Kakao => ProviderCredential {
            access_token: "kakao-at".to_string(),
            refresh_token: Some("kakao-rt".to_string()),
            proof: IdentityProof::Kakao {
                access_token: "kakao-at".to_string(),
            },
        },
        ProviderKind::Apple => ProviderCredential {
            access_token: "apple-id-token".to_string(),
            refresh_token: None,
            proof: IdentityProof::Apple {
                user_id: "001234.abcd".to_string(),
                identity_token: "apple-id-token".to_string(),
                authorization_code: "apple-code".to_string(),
            },
        },
    }
}
