//! Phase change publication.

use crate::ApplicationPhase;
use tokio::sync::broadcast;

/// Broadcast hub for application phase changes.
///
/// Phase values are published while the controller's state lock is held, so
/// subscribers observe transitions in the order they were produced. Messages
/// sent before subscription are not received.
#[derive(Debug)]
pub struct PhaseHub {
    sender: broadcast::Sender<ApplicationPhase>,
}

impl PhaseHub {
    /// Create a new hub with no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Subscribe to phase changes published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ApplicationPhase> {
        self.sender.subscribe()
    }

    /// Publish a phase value to all subscribers.
    pub(crate) fn publish(&self, phase: ApplicationPhase) {
        // No subscribers is a normal state; the send result is irrelevant.
        let _ = self.sender.send(phase);
    }

    /// The number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for PhaseHub {
    fn default() -> Self {
        Self::new()
    }
}
