//! # Transaction Lifecycle Tracker
//!
//! Reports `idle → preparing → pending → success | error` to observers.
//!
//! ```text
//! [IDLE] ──begin──→ [PREPARING] ──dispatched──→ [PENDING] ──complete──→ [SUCCESS]
//!   ↑                  │    │                       │
//!   └────abandon───────┘    └──fail──→ [ERROR] ←──fail──┘
//! ```
//!
//! `success` and `error` are terminal for the attempt; `begin` starts a new
//! one from any terminal state. Observers never see progress fractions.

use crate::domain::{LifecycleError, LifecycleState};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Cause recorded when an attempt's future is dropped before it resolves.
pub const ATTEMPT_DROPPED: &str = "attempt dropped before its outcome was observed";

/// Snapshot published to observers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus {
    /// Current state.
    pub state: LifecycleState,
    /// Completion reference, set in `success`.
    pub reference: Option<String>,
    /// Human-readable cause, set in `error`.
    pub error: Option<String>,
}

/// Single-writer lifecycle state machine with watch-channel observers.
#[derive(Debug)]
pub struct LifecycleTracker {
    tx: watch::Sender<TransactionStatus>,
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleTracker {
    /// Creates a tracker in `idle`.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(TransactionStatus::default());
        Self { tx }
    }

    /// Observe transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TransactionStatus> {
        self.tx.subscribe()
    }

    /// Current snapshot.
    #[must_use]
    pub fn status(&self) -> TransactionStatus {
        self.tx.borrow().clone()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.tx.borrow().state
    }

    /// `idle | success | error → preparing`.
    pub fn begin(&self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Preparing, None, None)
    }

    /// `preparing → pending`, once the attempt reaches the boundary.
    pub fn dispatched(&self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Pending, None, None)
    }

    /// `pending → success`.
    pub fn complete(&self, reference: Option<String>) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Success, reference, None)
    }

    /// `preparing | pending → error`.
    pub fn fail(&self, cause: impl Into<String>) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Error, None, Some(cause.into()))
    }

    /// `preparing → idle`: the caller abandoned the attempt before dispatch.
    pub fn abandon(&self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Idle, None, None)
    }

    /// `success | error → idle`.
    pub fn reset(&self) -> Result<(), LifecycleError> {
        if self.state().is_busy() {
            return Err(LifecycleError::InvalidTransition {
                from: self.state(),
                to: LifecycleState::Idle,
            });
        }
        if self.state() == LifecycleState::Idle {
            return Ok(());
        }
        self.transition(LifecycleState::Idle, None, None)
    }

    /// Marks the current attempt as owned by the caller until dropped.
    ///
    /// If the returned value is dropped while the tracker is still
    /// `preparing` or `pending`, the attempt moves to `error`, so a
    /// cancelled caller never leaves the tracker busy.
    #[must_use]
    pub fn attempt(&self) -> ActiveAttempt<'_> {
        ActiveAttempt { tracker: self }
    }

    fn transition(
        &self,
        next: LifecycleState,
        reference: Option<String>,
        error: Option<String>,
    ) -> Result<(), LifecycleError> {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|status| {
            if !status.state.can_transition_to(next) {
                outcome = Err(LifecycleError::InvalidTransition {
                    from: status.state,
                    to: next,
                });
                return false;
            }
            debug!(from = %status.state, to = %next, "Lifecycle transition");
            *status = TransactionStatus {
                state: next,
                reference,
                error,
            };
            true
        });
        outcome
    }
}

/// Drop guard for one attempt, see [`LifecycleTracker::attempt`].
#[derive(Debug)]
pub struct ActiveAttempt<'a> {
    tracker: &'a LifecycleTracker,
}

impl Drop for ActiveAttempt<'_> {
    fn drop(&mut self) {
        if self.tracker.state().is_busy() {
            warn!(state = %self.tracker.state(), "Attempt dropped while in flight");
            let _ = self.tracker.fail(ATTEMPT_DROPPED);
        }
    }
}
