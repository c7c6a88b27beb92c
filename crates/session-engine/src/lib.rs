//! Session and authentication orchestration for the keepin client.
//!
//! This crate decides, on cold start and after every login event, which
//! application phase the user is in by reconciling locally stored
//! identity-provider tokens with the backend session. It provides:
//! - An explicit FSM for the application phase
//! - The [`SessionController`] owning the signed-in account and phase
//! - Gateway traits for identity providers and the backend auth API
//! - Kakao and Apple gateway implementations
//! - A login orchestrator driving the provider → backend → session sequence

mod account;
mod apple;
mod backend;
mod callback;
mod controller;
mod error;
mod hub;
mod kakao;
mod login;
mod phase;
mod provider;

#[cfg(test)]
mod tests;

pub use account::Account;
pub use apple::AppleGateway;
pub use backend::{BackendSession, BackendSessionGateway, HttpBackendGateway, ProfileInfo};
pub use callback::{CallbackHit, CallbackServer, DEFAULT_CALLBACK_TIMEOUT_SECS};
pub use controller::{SessionController, SessionSnapshot};
pub use error::{SessionError, SessionResult};
pub use hub::PhaseHub;
pub use kakao::KakaoGateway;
pub use login::{LoginOrchestrator, LoginReport};
pub use phase::phase_machine;
pub use phase::{ApplicationPhase, PhaseInput, PhaseMachine, PhaseState};
pub use provider::{
    IdentityProof, IdentityProviderGateway, LoginOutcome, ProviderCredential,
    ProviderSessionStatus,
};

pub use credential_store::{ProviderKind, TokenKind};
