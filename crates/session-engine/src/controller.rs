//! The session controller: owner of the signed-in account and the
//! application phase.
//!
//! All mutations of the account and phase are applied under one state lock;
//! the network calls that produce new values run outside it. A monotonically
//! increasing generation counter guards reconciliation: every explicit
//! mutation bumps it, and a reconciliation commit is discarded when the
//! generation it captured at start is no longer current. At most one
//! reconciliation runs at a time.

use crate::account::Account;
use crate::backend::BackendSessionGateway;
use crate::hub::PhaseHub;
use crate::phase::{ApplicationPhase, PhaseInput, PhaseMachine, PhaseState};
use crate::provider::{IdentityProviderGateway, ProviderSessionStatus};
use crate::{SessionError, SessionResult};
use consent_store::ConsentLedger;
use credential_store::{ProviderKind, TokenKind, TokenStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Snapshot of session state for status reporting.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: ApplicationPhase,
    pub account: Option<Account>,
}

struct ControllerState {
    machine: PhaseMachine,
    account: Option<Account>,
}

/// The session state machine.
///
/// Constructed once by the application's composition root and shared by the
/// login flow and the presentation layer.
pub struct SessionController {
    tokens: Arc<TokenStore>,
    consent: Arc<ConsentLedger>,
    providers: HashMap<ProviderKind, Arc<dyn IdentityProviderGateway>>,
    backend: Arc<dyn BackendSessionGateway>,
    state: Mutex<ControllerState>,
    /// Bumped by every explicit mutation; reconciliation commits compare
    /// against the value they captured at start.
    generation: AtomicU64,
    /// Serializes reconciliation attempts.
    reconcile_gate: tokio::sync::Mutex<()>,
    hub: PhaseHub,
}

impl SessionController {
    /// Create a new controller.
    pub fn new(
        tokens: Arc<TokenStore>,
        consent: Arc<ConsentLedger>,
        providers: impl IntoIterator<Item = Arc<dyn IdentityProviderGateway>>,
        backend: Arc<dyn BackendSessionGateway>,
    ) -> Self {
        let providers = providers
            .into_iter()
            .map(|gateway| (gateway.kind(), gateway))
            .collect();

        Self {
            tokens,
            consent,
            providers,
            backend,
            state: Mutex::new(ControllerState {
                machine: PhaseMachine::new(),
                account: None,
            }),
            generation: AtomicU64::new(0),
            reconcile_gate: tokio::sync::Mutex::new(()),
            hub: PhaseHub::new(),
        }
    }

    /// The current application phase.
    pub fn current_phase(&self) -> ApplicationPhase {
        let state = self.state.lock().unwrap();
        ApplicationPhase::from(state.machine.state())
    }

    /// The signed-in account, if any.
    pub fn current_account(&self) -> Option<Account> {
        let state = self.state.lock().unwrap();
        state.account.clone()
    }

    /// Phase and account in one consistent read.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().unwrap();
        SessionSnapshot {
            phase: ApplicationPhase::from(state.machine.state()),
            account: state.account.clone(),
        }
    }

    /// Subscribe to phase changes published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ApplicationPhase> {
        self.hub.subscribe()
    }

    fn gateway(&self, kind: ProviderKind) -> SessionResult<&Arc<dyn IdentityProviderGateway>> {
        self.providers
            .get(&kind)
            .ok_or_else(|| SessionError::Config(format!("no gateway registered for {}", kind)))
    }

    /// Apply a phase machine input, publishing the new phase if it changed.
    fn apply(
        state: &mut ControllerState,
        hub: &PhaseHub,
        input: &PhaseInput,
    ) -> SessionResult<ApplicationPhase> {
        let before = ApplicationPhase::from(state.machine.state());

        state.machine.consume(input).map_err(|_| {
            SessionError::InvalidTransition(format!("cannot apply {:?} in {:?}", input, before))
        })?;

        let after = ApplicationPhase::from(state.machine.state());
        if before != after {
            debug!(from = ?before, to = ?after, "phase transition");
            hub.publish(after);
        }

        Ok(after)
    }

    /// Run the auto-login reconciliation and publish the resulting phase.
    ///
    /// Decision sequence:
    /// 1. No stored provider credential → `Unauthenticated`.
    /// 2. Provider rejects (or cannot confirm) the stored credential → sign
    ///    out. An ambiguous network failure is treated as a rejection rather
    ///    than silently staying signed in.
    /// 3. Backend access token present → phase per the consent flag; the
    ///    profile is rebuilt from the persisted account snapshot, not
    ///    re-fetched.
    /// 4. No backend refresh token → sign out.
    /// 5. Refresh the backend access token; persist on success, sign out on
    ///    failure.
    pub async fn bootstrap(&self) -> SessionResult<ApplicationPhase> {
        let _running = self.reconcile_gate.lock().await;
        let generation = self.generation.load(Ordering::SeqCst);

        // Step 1: which provider has a stored credential? Kakao first.
        let provider = match self.tokens.stored_provider()? {
            Some(provider) => provider,
            None => {
                info!("no stored provider credential, sign-in required");
                return Ok(self.current_phase());
            }
        };

        let credential = match self.tokens.get(provider, TokenKind::ProviderAccess)? {
            Some(credential) => credential,
            None => {
                warn!(provider = %provider, "stored credential disappeared, signing out");
                return self.conclude_signed_out(generation, Some(provider));
            }
        };

        // Step 2: does the provider still accept the stored credential?
        let validity = match self.gateway(provider)?.validate_session(&credential).await {
            Ok(validity) => validity,
            Err(e) => {
                warn!(provider = %provider, error = %e, "provider validation errored");
                ProviderSessionStatus::Unreachable
            }
        };

        match validity {
            ProviderSessionStatus::Valid => {}
            ProviderSessionStatus::Invalid => {
                info!(provider = %provider, "provider rejected stored credential, signing out");
                return self.conclude_signed_out(generation, Some(provider));
            }
            ProviderSessionStatus::Unreachable => {
                warn!(provider = %provider, "provider unreachable, treating stored session as invalid");
                return self.conclude_signed_out(generation, Some(provider));
            }
        }

        // Step 3: an existing backend access token keeps the session alive.
        if let Some(access_token) = self.tokens.get(provider, TokenKind::BackendAccess)? {
            let mut state = self.state.lock().unwrap();
            if self.stale(generation, &state) {
                return Ok(ApplicationPhase::from(state.machine.state()));
            }
            return self.restore_locked(&mut state, provider, access_token);
        }

        // Step 4: without a refresh token there is nothing left to try.
        let refresh_token = match self.tokens.get(provider, TokenKind::BackendRefresh)? {
            Some(token) => token,
            None => {
                info!(provider = %provider, "no backend refresh token, signing out");
                return self.conclude_signed_out(generation, Some(provider));
            }
        };

        // Step 5: re-establish the backend session from the refresh token.
        info!(provider = %provider, "no backend access token, attempting refresh");
        match self.backend.refresh(&refresh_token).await {
            Ok(new_access_token) => {
                let mut state = self.state.lock().unwrap();
                if self.stale(generation, &state) {
                    return Ok(ApplicationPhase::from(state.machine.state()));
                }
                self.tokens
                    .set(provider, TokenKind::BackendAccess, &new_access_token)?;
                self.restore_locked(&mut state, provider, new_access_token)
            }
            Err(e) => {
                warn!(provider = %provider, error = %e, "backend refresh failed, signing out");
                self.conclude_signed_out(generation, Some(provider))
            }
        }
    }

    /// Whether a reconciliation result captured at `generation` has been
    /// superseded by an explicit mutation. Must be called with the state
    /// lock held.
    fn stale(&self, generation: u64, _state: &MutexGuard<'_, ControllerState>) -> bool {
        let superseded = self.generation.load(Ordering::SeqCst) != generation;
        if superseded {
            debug!("discarding stale reconciliation result");
        }
        superseded
    }

    fn stale_guard<'a>(
        &self,
        generation: u64,
        state: &'a MutexGuard<'_, ControllerState>,
    ) -> Option<ApplicationPhase> {
        if self.stale(generation, state) {
            Some(ApplicationPhase::from(state.machine.state()))
        } else {
            None
        }
    }

    /// Sign out on behalf of a reconciliation attempt, unless superseded.
    fn conclude_signed_out(
        &self,
        generation: u64,
        provider: Option<ProviderKind>,
    ) -> SessionResult<ApplicationPhase> {
        let mut state = self.state.lock().unwrap();
        if let Some(phase) = self.stale_guard(generation, &state) {
            return Ok(phase);
        }
        self.sign_out_locked(&mut state, provider)
    }

    /// Rebuild the account from stored material and commit the signed-in
    /// phase. Must be called with the state lock held and the generation
    /// already checked.
    fn restore_locked(
        &self,
        state: &mut MutexGuard<'_, ControllerState>,
        provider: ProviderKind,
        access_token: String,
    ) -> SessionResult<ApplicationPhase> {
        // A committed reconciliation leaves the generation untouched, so a
        // repeated bootstrap can land here already signed in; the stored
        // session it would install is the one already installed.
        if !matches!(state.machine.state(), PhaseState::Unauthenticated) {
            return Ok(ApplicationPhase::from(state.machine.state()));
        }

        let record = match self.tokens.get_account()? {
            Some(record) if record.provider == provider => record,
            other => {
                warn!(
                    provider = %provider,
                    found = other.is_some(),
                    "stored account snapshot missing or inconsistent, signing out"
                );
                return self.sign_out_locked(state, Some(provider));
            }
        };

        let refresh_token = self.tokens.get(provider, TokenKind::BackendRefresh)?;
        let account = Account::from_record(record, access_token, refresh_token);

        let agreed = self.consent.is_agreed(provider)?;
        let input = if agreed {
            PhaseInput::LoginReady
        } else {
            PhaseInput::LoginPendingConsent
        };

        let phase = Self::apply(state, &self.hub, &input)?;
        state.account = Some(account);

        info!(provider = %provider, phase = ?phase, "session restored from stored tokens");

        Ok(phase)
    }

    /// Clear stored session material and return to `Unauthenticated`. Must
    /// be called with the state lock held.
    fn sign_out_locked(
        &self,
        state: &mut MutexGuard<'_, ControllerState>,
        provider: Option<ProviderKind>,
    ) -> SessionResult<ApplicationPhase> {
        match provider {
            Some(provider) => self.tokens.clear(provider)?,
            None => self.tokens.clear_all()?,
        }
        self.tokens.clear_account()?;
        state.account = None;
        Self::apply(state, &self.hub, &PhaseInput::LogoutRequested)
    }

    /// Install a freshly logged-in account.
    ///
    /// Called by the login flow once it holds a complete account
    /// (post-consent or consent-exempt). Persists the backend tokens and the
    /// account snapshot, clears the other provider's tokens, and moves to
    /// `NeedsConsent` or `SteadyState` per the consent flag.
    pub fn complete_login(&self, account: Account) -> SessionResult<ApplicationPhase> {
        let mut state = self.state.lock().unwrap();

        // Validate the phase before touching storage so a misplaced call
        // leaves no partial writes behind.
        if !matches!(state.machine.state(), PhaseState::Unauthenticated) {
            return Err(SessionError::InvalidTransition(format!(
                "login completed in {:?}",
                ApplicationPhase::from(state.machine.state())
            )));
        }

        self.generation.fetch_add(1, Ordering::SeqCst);

        let provider = account.provider;

        // Exactly one signed-in identity at a time.
        self.tokens.clear(provider.other())?;

        self.tokens
            .set(provider, TokenKind::BackendAccess, &account.access_token)?;
        if let Some(refresh_token) = &account.refresh_token {
            self.tokens
                .set(provider, TokenKind::BackendRefresh, refresh_token)?;
        }
        self.tokens.set_account(&account.record())?;

        let agreed = self.consent.is_agreed(provider)?;
        let input = if agreed {
            PhaseInput::LoginReady
        } else {
            PhaseInput::LoginPendingConsent
        };

        let phase = Self::apply(&mut state, &self.hub, &input)?;
        state.account = Some(account);

        info!(provider = %provider, phase = ?phase, "login complete");

        Ok(phase)
    }

    /// Record consent for the signed-in account's provider and advance to
    /// the contact-import onboarding step.
    pub fn complete_consent(&self) -> SessionResult<ApplicationPhase> {
        let mut state = self.state.lock().unwrap();
        let provider = state
            .account
            .as_ref()
            .map(|account| account.provider)
            .ok_or(SessionError::NotAuthenticated)?;

        if !matches!(state.machine.state(), PhaseState::NeedsConsent) {
            return Err(SessionError::InvalidTransition(format!(
                "consent granted in {:?}",
                ApplicationPhase::from(state.machine.state())
            )));
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        self.consent.set_agreed(provider)?;
        Self::apply(&mut state, &self.hub, &PhaseInput::ConsentGranted)
    }

    /// Contact import finished; advance to the frequency step.
    pub fn complete_onboarding_import(&self) -> SessionResult<ApplicationPhase> {
        self.advance(&PhaseInput::ImportCompleted)
    }

    /// Contact import skipped; go straight to steady state.
    pub fn skip_onboarding_import(&self) -> SessionResult<ApplicationPhase> {
        self.advance(&PhaseInput::ImportSkipped)
    }

    /// Frequency setup finished; onboarding is done.
    pub fn complete_onboarding_frequency(&self) -> SessionResult<ApplicationPhase> {
        self.advance(&PhaseInput::FrequencyCompleted)
    }

    /// Step back from the frequency screen to contact import.
    pub fn onboarding_frequency_back(&self) -> SessionResult<ApplicationPhase> {
        self.advance(&PhaseInput::FrequencyStepBack)
    }

    fn advance(&self, input: &PhaseInput) -> SessionResult<ApplicationPhase> {
        let mut state = self.state.lock().unwrap();
        self.generation.fetch_add(1, Ordering::SeqCst);
        Self::apply(&mut state, &self.hub, input)
    }

    /// Clear all session material and return to `Unauthenticated`.
    ///
    /// Safe to call from any phase, including while a reconciliation is in
    /// flight: the generation bump makes the pending reconciliation discard
    /// its eventual result.
    pub fn logout(&self) -> SessionResult<()> {
        let mut state = self.state.lock().unwrap();
        self.generation.fetch_add(1, Ordering::SeqCst);

        let provider = state
            .account
            .as_ref()
            .map(|account| account.provider)
            .or_else(|| self.tokens.stored_provider().ok().flatten());

        self.sign_out_locked(&mut state, provider)?;

        info!("signed out");
        Ok(())
    }
}
