//! Phase-to-screen routing.
//!
//! The presentation boundary: maps the current application phase to the
//! screen the shell should present. The real mobile shells consume the same
//! phase stream; this mapping is the contract they render from.

use session_engine::ApplicationPhase;

/// Screens the shell can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Provider sign-in screen
    Login,
    /// One-time terms agreement sheet
    Terms,
    /// Contact import onboarding step
    RegisterFriends,
    /// Contact frequency onboarding step
    SetFrequency,
    /// The main app
    Home,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Login => "login",
            Screen::Terms => "terms",
            Screen::RegisterFriends => "register-friends",
            Screen::SetFrequency => "set-frequency",
            Screen::Home => "home",
        }
    }
}

/// Selects the screen to present for a phase.
pub struct PhaseRouter;

impl PhaseRouter {
    pub fn screen_for(phase: ApplicationPhase) -> Screen {
        match phase {
            ApplicationPhase::Unauthenticated => Screen::Login,
            ApplicationPhase::NeedsConsent => Screen::Terms,
            ApplicationPhase::NeedsOnboardingImport => Screen::RegisterFriends,
            ApplicationPhase::NeedsOnboardingFrequency => Screen::SetFrequency,
            ApplicationPhase::SteadyState => Screen::Home,
        }
    }
}
