//! Application phase state machine using rust-fsm.
//!
//! The phase is the single source of truth the presentation layer renders
//! from. Transitions are driven only by the session controller and by the
//! explicit onboarding completion events.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │ Unauthenticated │ (initial)
//! └────────┬────────┘
//!          │ LoginPendingConsent          LoginReady (consent already given)
//!          ▼                                   │
//! ┌─────────────────┐  ConsentGranted          │
//! │  NeedsConsent   │ ───────────┐             │
//! └─────────────────┘            ▼             │
//!                  ┌──────────────────────┐    │
//!                  │ NeedsOnboardingImport│    │
//!                  └──────────┬───────────┘    │
//!     ImportCompleted         │  ImportSkipped │
//!          ▼                  │                │
//! ┌─────────────────────────┐ │                │
//! │ NeedsOnboardingFrequency│◄┘                │
//! └────────────┬────────────┘                  │
//!              │ FrequencyCompleted            │
//!              ▼                               ▼
//!       ┌─────────────┐◄───────────────────────┘
//!       │ SteadyState │
//!       └─────────────┘
//!
//! LogoutRequested returns to Unauthenticated from every state.
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

// Define the FSM using rust-fsm's declarative macro.
// This generates a module `phase_machine` with:
// - phase_machine::State (enum)
// - phase_machine::Input (enum)
// - phase_machine::StateMachine (type alias)
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub phase_machine(Unauthenticated)

    Unauthenticated => {
        LoginPendingConsent => NeedsConsent,
        LoginReady => SteadyState,
        LogoutRequested => Unauthenticated
    },
    NeedsConsent => {
        ConsentGranted => NeedsOnboardingImport,
        LogoutRequested => Unauthenticated
    },
    NeedsOnboardingImport => {
        ImportCompleted => NeedsOnboardingFrequency,
        ImportSkipped => SteadyState,
        LogoutRequested => Unauthenticated
    },
    NeedsOnboardingFrequency => {
        FrequencyCompleted => SteadyState,
        FrequencyStepBack => NeedsOnboardingImport,
        LogoutRequested => Unauthenticated
    },
    SteadyState => {
        LogoutRequested => Unauthenticated
    }
}

// Re-export the generated types with clearer names
pub use phase_machine::Input as PhaseInput;
pub use phase_machine::State as PhaseState;
pub use phase_machine::StateMachine as PhaseMachine;

/// Application phase for external consumption.
///
/// A serde-friendly view of the FSM state for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationPhase {
    /// No signed-in account; the login screen is shown.
    Unauthenticated,
    /// Signed in but the one-time terms agreement is outstanding.
    NeedsConsent,
    /// Terms agreed; the contact-import onboarding step is outstanding.
    NeedsOnboardingImport,
    /// Contacts chosen; the contact-frequency onboarding step is outstanding.
    NeedsOnboardingFrequency,
    /// Fully onboarded.
    SteadyState,
}

impl ApplicationPhase {
    /// Returns true if a signed-in account exists in this phase.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, ApplicationPhase::Unauthenticated)
    }

    /// Returns true if the phase is one of the onboarding steps.
    pub fn is_onboarding(&self) -> bool {
        matches!(
            self,
            ApplicationPhase::NeedsOnboardingImport | ApplicationPhase::NeedsOnboardingFrequency
        )
    }
}

impl From<&PhaseState> for ApplicationPhase {
    fn from(state: &PhaseState) -> Self {
        match state {
            PhaseState::Unauthenticated => ApplicationPhase::Unauthenticated,
            PhaseState::NeedsConsent => ApplicationPhase::NeedsConsent,
            PhaseState::NeedsOnboardingImport => ApplicationPhase::NeedsOnboardingImport,
            PhaseState::NeedsOnboardingFrequency => ApplicationPhase::NeedsOnboardingFrequency,
            PhaseState::SteadyState => ApplicationPhase::SteadyState,
        }
    }
}
