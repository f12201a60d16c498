//! Participant side of the two-phase commit protocol.
//!
//! A participant owns exactly one piece of mutable protocol state, its
//! [`ParticipantState`], and `transition` is the only mutator. Failure to
//! prepare is a state, not an error: the coordinator reads it after the
//! phase barrier and decides what to do.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::config::TransactionConfig;
use crate::decision::{decision_slot, Decision, DecisionReceiver, DecisionSender};
use crate::events::{EventLog, TransitionEvent};
use crate::providers::{Providers, RandomProvider, TimeProvider};

/// Stable unique identifier for a participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Protocol state of a participant. A participant is in exactly one state
/// at any instant.
///
/// ```text
/// Preparing -> Prepared              (prepare succeeds)
/// Preparing -> Failed                (prepare fails, probabilistic)
/// Failed    -> Preparing             (supervised recovery)
/// Prepared  -> Committing -> Committed   (COMMIT decision)
/// Prepared  -> Aborting   -> Aborted     (ABORT decision)
/// Prepared  -> Aborted               (decision timeout)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantState {
    /// Voting in progress.
    Preparing,
    /// Voted to commit; waiting for the decision.
    Prepared,
    /// Could not vote; eligible for supervised recovery.
    Failed,
    /// Applying a COMMIT decision.
    Committing,
    /// Terminal: transaction finalized.
    Committed,
    /// Rolling back on an ABORT decision.
    Aborting,
    /// Terminal: transaction rolled back.
    Aborted,
}

impl ParticipantState {
    /// Whether this state ends the participant's transaction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ParticipantState::Committed | ParticipantState::Aborted)
    }
}

impl fmt::Display for ParticipantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParticipantState::Preparing => "PREPARING",
            ParticipantState::Prepared => "PREPARED",
            ParticipantState::Failed => "FAILED",
            ParticipantState::Committing => "COMMITTING",
            ParticipantState::Committed => "COMMITTED",
            ParticipantState::Aborting => "ABORTING",
            ParticipantState::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

/// One transaction participant.
///
/// Lives behind an `Rc` so the coordinator can run per-phase tasks against
/// it; interior mutability keeps state single-writer on one thread.
pub struct Participant<P: Providers> {
    id: ParticipantId,
    state: RefCell<ParticipantState>,
    decision: RefCell<Option<DecisionReceiver>>,
    config: TransactionConfig,
    providers: P,
    events: EventLog,
}

impl<P: Providers> Participant<P> {
    /// Create a participant in the `Preparing` state.
    pub fn new(
        id: impl Into<ParticipantId>,
        config: TransactionConfig,
        providers: P,
        events: EventLog,
    ) -> Rc<Self> {
        Rc::new(Self {
            id: id.into(),
            state: RefCell::new(ParticipantState::Preparing),
            decision: RefCell::new(None),
            config,
            providers,
            events,
        })
    }

    /// This participant's identifier.
    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    /// Current protocol state.
    pub fn state(&self) -> ParticipantState {
        *self.state.borrow()
    }

    /// The only state mutator. Records the transition in the event log;
    /// same-state transitions are not recorded.
    fn transition(&self, to: ParticipantState) {
        let from = *self.state.borrow();
        if from == to {
            return;
        }
        *self.state.borrow_mut() = to;
        tracing::info!(participant = %self.id, %from, %to, "state transition");
        self.events.record(TransitionEvent {
            participant: self.id.clone(),
            from,
            to,
            at: self.providers.time().now(),
        });
    }

    /// Reset to `Preparing` and arm a fresh decision slot.
    ///
    /// The returned sender goes to the coordinator; it is the only way a
    /// decision reaches this participant, and it is single-use.
    pub fn start_transaction(&self) -> DecisionSender {
        tracing::info!(participant = %self.id, "transaction started");
        self.transition(ParticipantState::Preparing);
        let (sender, receiver) = decision_slot(self.id.clone());
        *self.decision.borrow_mut() = Some(receiver);
        sender
    }

    /// Run the voting step: simulated work, then either `Prepared` or
    /// (with the configured probability) `Failed`.
    pub async fn prepare(&self) {
        tracing::info!(participant = %self.id, "preparing");
        let delay = self
            .providers
            .random()
            .random_duration(self.config.prepare_delay.clone());
        self.providers.time().sleep(delay).await;

        if self
            .providers
            .random()
            .random_bool(self.config.failure_probability)
        {
            tracing::warn!(participant = %self.id, "failure during preparation");
            self.transition(ParticipantState::Failed);
            return;
        }
        self.transition(ParticipantState::Prepared);
    }

    /// Supervised recovery: `Failed` -> `Preparing` after the recovery delay.
    ///
    /// Invoked by the coordinator between prepare rounds, never by the
    /// participant on its own, so recovery cannot race a decision phase that
    /// already ran. No-op in any other state.
    pub async fn recover(&self) {
        if self.state() != ParticipantState::Failed {
            return;
        }
        tracing::info!(participant = %self.id, "recovery started");
        let delay = self
            .providers
            .random()
            .random_duration(self.config.recovery_delay.clone());
        self.providers.time().sleep(delay).await;
        self.transition(ParticipantState::Preparing);
    }

    /// Run the decision step.
    ///
    /// Only a `Prepared` participant waits for a decision; `Failed` is
    /// explicitly skipped and every other state (including the terminal
    /// ones) is a no-op, which makes a repeated call idempotent.
    pub async fn commit_or_abort(&self) {
        match self.state() {
            ParticipantState::Prepared => {
                let decision = self.await_decision().await;
                self.apply_decision(decision).await;
            }
            ParticipantState::Failed => {
                tracing::info!(participant = %self.id, "skipping decision phase, participant failed");
            }
            other => {
                tracing::debug!(
                    participant = %self.id,
                    state = %other,
                    "decision phase is a no-op in this state"
                );
            }
        }
    }

    /// Wait on the armed decision slot, bounded by the decision timeout.
    ///
    /// `None` means ambiguity: timeout, sender dropped, or no slot armed.
    async fn await_decision(&self) -> Option<Decision> {
        let receiver = self.decision.borrow_mut().take();
        let Some(receiver) = receiver else {
            tracing::warn!(participant = %self.id, "no decision slot armed");
            return None;
        };
        match self
            .providers
            .time()
            .timeout(self.config.decision_timeout, receiver.wait())
            .await
        {
            Ok(Some(decision)) => Some(decision),
            Ok(None) => {
                tracing::warn!(participant = %self.id, "decision slot closed without a decision");
                None
            }
            Err(_) => {
                tracing::warn!(participant = %self.id, "timed out waiting for decision");
                None
            }
        }
    }

    async fn apply_decision(&self, decision: Option<Decision>) {
        match decision {
            Some(Decision::Commit) => {
                self.transition(ParticipantState::Committing);
                let delay = self
                    .providers
                    .random()
                    .random_duration(self.config.commit_delay.clone());
                self.providers.time().sleep(delay).await;
                self.transition(ParticipantState::Committed);
            }
            Some(Decision::Abort) => {
                self.transition(ParticipantState::Aborting);
                let delay = self
                    .providers
                    .random()
                    .random_duration(self.config.abort_delay.clone());
                self.providers.time().sleep(delay).await;
                self.transition(ParticipantState::Aborted);
            }
            // Abort on ambiguity, straight to the terminal state.
            None => self.transition(ParticipantState::Aborted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TokioProviders;
    use std::time::Duration;

    fn participant(failure_probability: f64) -> Rc<Participant<TokioProviders>> {
        let config = TransactionConfig {
            failure_probability,
            decision_timeout: Duration::from_millis(50),
            ..TransactionConfig::instant()
        };
        Participant::new("P1", config, TokioProviders::new(), EventLog::new())
    }

    #[tokio::test]
    async fn prepare_succeeds_when_failure_probability_is_zero() {
        let p = participant(0.0);
        let _sender = p.start_transaction();
        p.prepare().await;
        assert_eq!(p.state(), ParticipantState::Prepared);
    }

    #[tokio::test]
    async fn prepare_fails_when_failure_probability_is_one() {
        let p = participant(1.0);
        let _sender = p.start_transaction();
        p.prepare().await;
        assert_eq!(p.state(), ParticipantState::Failed);
    }

    #[tokio::test]
    async fn commit_decision_reaches_committed() {
        let p = participant(0.0);
        let sender = p.start_transaction();
        p.prepare().await;
        sender.deliver(Decision::Commit).unwrap();
        p.commit_or_abort().await;
        assert_eq!(p.state(), ParticipantState::Committed);
        assert_eq!(
            p.events.transitions_for(p.id()),
            vec![
                (ParticipantState::Preparing, ParticipantState::Prepared),
                (ParticipantState::Prepared, ParticipantState::Committing),
                (ParticipantState::Committing, ParticipantState::Committed),
            ]
        );
    }

    #[tokio::test]
    async fn abort_decision_reaches_aborted() {
        let p = participant(0.0);
        let sender = p.start_transaction();
        p.prepare().await;
        sender.deliver(Decision::Abort).unwrap();
        p.commit_or_abort().await;
        assert_eq!(p.state(), ParticipantState::Aborted);
        assert_eq!(
            p.events.transitions_for(p.id()),
            vec![
                (ParticipantState::Preparing, ParticipantState::Prepared),
                (ParticipantState::Prepared, ParticipantState::Aborting),
                (ParticipantState::Aborting, ParticipantState::Aborted),
            ]
        );
    }

    #[tokio::test]
    async fn decision_timeout_aborts_directly() {
        let p = participant(0.0);
        let sender = p.start_transaction();
        p.prepare().await;
        // Keep the sender alive but never deliver.
        p.commit_or_abort().await;
        assert!(!sender.is_delivered());
        assert_eq!(p.state(), ParticipantState::Aborted);
        // No Aborting step on the timeout path.
        assert_eq!(
            p.events.transitions_for(p.id()).last(),
            Some(&(ParticipantState::Prepared, ParticipantState::Aborted))
        );
    }

    #[tokio::test]
    async fn failed_participant_skips_decision_phase() {
        let p = participant(1.0);
        let _sender = p.start_transaction();
        p.prepare().await;
        p.commit_or_abort().await;
        assert_eq!(p.state(), ParticipantState::Failed);
    }

    #[tokio::test]
    async fn decision_phase_is_idempotent_in_terminal_state() {
        let p = participant(0.0);
        let sender = p.start_transaction();
        p.prepare().await;
        sender.deliver(Decision::Commit).unwrap();
        p.commit_or_abort().await;
        assert_eq!(p.state(), ParticipantState::Committed);

        let events_before = p.events.snapshot().len();
        p.commit_or_abort().await;
        assert_eq!(p.state(), ParticipantState::Committed);
        assert_eq!(p.events.snapshot().len(), events_before);
    }

    #[tokio::test]
    async fn recovery_returns_to_preparing() {
        let p = participant(1.0);
        let _sender = p.start_transaction();
        p.prepare().await;
        assert_eq!(p.state(), ParticipantState::Failed);
        p.recover().await;
        assert_eq!(p.state(), ParticipantState::Preparing);
    }

    #[tokio::test]
    async fn recovery_is_a_noop_unless_failed() {
        let p = participant(0.0);
        let _sender = p.start_transaction();
        p.prepare().await;
        p.recover().await;
        assert_eq!(p.state(), ParticipantState::Prepared);
    }
}
