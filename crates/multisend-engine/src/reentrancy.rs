//! # Reentrancy Guard
//!
//! Per-actor exclusion: while one attempt for an actor is in flight, a second
//! attempt from the same actor is rejected immediately, never queued.
//! Independent actors proceed concurrently.

use crate::domain::Address;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Set of actors with an attempt in flight.
#[derive(Debug, Default, Clone)]
pub struct ReentrancyGuard {
    in_flight: Arc<Mutex<HashSet<Address>>>,
}

impl ReentrancyGuard {
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `actor` in flight. `None` if it already is.
    #[must_use]
    pub fn try_enter(&self, actor: Address) -> Option<InFlight> {
        if !self.in_flight.lock().insert(actor) {
            return None;
        }
        Some(InFlight {
            actor,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Whether `actor` is in flight.
    #[must_use]
    pub fn is_in_flight(&self, actor: &Address) -> bool {
        self.in_flight.lock().contains(actor)
    }

    /// Number of actors in flight.
    #[must_use]
    pub fn active(&self) -> usize {
        self.in_flight.lock().len()
    }
}

/// Held for the duration of one attempt; releases the actor on drop,
/// including when the attempt's future is dropped mid-flight.
#[derive(Debug)]
pub struct InFlight {
    actor: Address,
    in_flight: Arc<Mutex<HashSet<Address>>>,
}

impl InFlight {
    /// The guarded actor.
    #[must_use]
    pub fn actor(&self) -> Address {
        self.actor
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.actor);
    }
}
