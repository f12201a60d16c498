//! Observable record of participant state transitions.
//!
//! Console output is not a contract; the [`EventLog`] is. Every state change
//! goes through it, so tests assert on the exact transition sequence instead
//! of scraping log lines.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::participant::{ParticipantId, ParticipantState};

/// One recorded state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    /// Which participant transitioned.
    pub participant: ParticipantId,
    /// State before the transition.
    pub from: ParticipantState,
    /// State after the transition.
    pub to: ParticipantState,
    /// Time of the transition, from the run's time provider.
    pub at: Duration,
}

/// Shared append-only log of transitions for one transaction run.
///
/// Cheaply cloneable handle; all clones append to the same log. Single
/// threaded, like the rest of the simulation.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Rc<RefCell<Vec<TransitionEvent>>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition.
    pub fn record(&self, event: TransitionEvent) {
        self.inner.borrow_mut().push(event);
    }

    /// Copy of everything recorded so far, in append order.
    pub fn snapshot(&self) -> Vec<TransitionEvent> {
        self.inner.borrow().clone()
    }

    /// The `(from, to)` pairs recorded for one participant, in order.
    pub fn transitions_for(&self, id: &ParticipantId) -> Vec<(ParticipantState, ParticipantState)> {
        self.inner
            .borrow()
            .iter()
            .filter(|e| &e.participant == id)
            .map(|e| (e.from, e.to))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_log() {
        let log = EventLog::new();
        let clone = log.clone();
        clone.record(TransitionEvent {
            participant: ParticipantId::from("P1"),
            from: ParticipantState::Preparing,
            to: ParticipantState::Prepared,
            at: Duration::ZERO,
        });
        assert_eq!(log.snapshot().len(), 1);
    }

    #[test]
    fn transitions_are_filtered_per_participant() {
        let log = EventLog::new();
        for id in ["P1", "P2", "P1"] {
            log.record(TransitionEvent {
                participant: ParticipantId::from(id),
                from: ParticipantState::Preparing,
                to: ParticipantState::Failed,
                at: Duration::ZERO,
            });
        }
        assert_eq!(log.transitions_for(&ParticipantId::from("P1")).len(), 2);
        assert_eq!(log.transitions_for(&ParticipantId::from("P2")).len(), 1);
    }
}
