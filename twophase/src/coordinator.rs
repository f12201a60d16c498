//! Coordinator side of the two-phase commit protocol.
//!
//! The coordinator owns the participant set, fans each phase out as one
//! local task per participant, and barrier-waits on the join handles before
//! moving on. The phase-one result is the aggregate vote: COMMIT only if
//! every participant reached `Prepared`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::TransactionConfig;
use crate::decision::{Decision, DecisionSender};
use crate::error::TransactionError;
use crate::participant::{Participant, ParticipantId, ParticipantState};
use crate::providers::{Providers, TaskProvider};

/// Drives one transaction across a fixed set of participants.
///
/// The participant collection is fixed once a transaction begins:
/// registration happens-before `start_transaction` and the collection is
/// read-only during the concurrent phases.
pub struct Coordinator<P: Providers> {
    participants: Vec<Rc<Participant<P>>>,
    senders: RefCell<HashMap<ParticipantId, DecisionSender>>,
    config: TransactionConfig,
    providers: P,
}

impl<P: Providers> Coordinator<P> {
    /// Create a coordinator with no participants.
    pub fn new(config: TransactionConfig, providers: P) -> Self {
        Self {
            participants: Vec::new(),
            senders: RefCell::new(HashMap::new()),
            config,
            providers,
        }
    }

    /// Register a participant. Order of registration is preserved for the
    /// lifetime of the run; duplicate IDs are rejected.
    pub fn register(&mut self, participant: Rc<Participant<P>>) -> Result<(), TransactionError> {
        if self.participants.iter().any(|p| p.id() == participant.id()) {
            return Err(TransactionError::DuplicateParticipant(
                participant.id().clone(),
            ));
        }
        self.participants.push(participant);
        Ok(())
    }

    /// The registered participants, in registration order.
    pub fn participants(&self) -> &[Rc<Participant<P>>] {
        &self.participants
    }

    /// Broadcast transaction start and collect one decision sender per
    /// participant. Sequential; there is no work to overlap.
    pub fn start_transaction(&self) {
        tracing::info!(participants = self.participants.len(), "transaction started");
        let mut senders = self.senders.borrow_mut();
        senders.clear();
        for participant in &self.participants {
            let sender = participant.start_transaction();
            senders.insert(participant.id().clone(), sender);
        }
    }

    /// Phase one: concurrent prepare across all participants, then up to
    /// `retry_budget` supervised recovery rounds for the ones that failed.
    ///
    /// Returns the aggregate vote: [`Decision::Commit`] iff every
    /// participant reached `Prepared`, otherwise [`Decision::Abort`].
    pub async fn prepare(&self) -> Decision {
        tracing::info!(participants = self.participants.len(), "prepare phase started");
        self.prepare_round(self.participants.to_vec(), false).await;

        for round in 1..=self.config.retry_budget {
            let failed: Vec<_> = self
                .participants
                .iter()
                .filter(|p| p.state() == ParticipantState::Failed)
                .cloned()
                .collect();
            if failed.is_empty() {
                break;
            }
            tracing::info!(round, failed = failed.len(), "recovery round started");
            self.prepare_round(failed, true).await;
        }

        let vote = if self
            .participants
            .iter()
            .all(|p| p.state() == ParticipantState::Prepared)
        {
            Decision::Commit
        } else {
            Decision::Abort
        };
        tracing::info!(%vote, "prepare phase complete");
        vote
    }

    /// One fan-out/fan-in round of prepare work.
    async fn prepare_round(&self, participants: Vec<Rc<Participant<P>>>, recover_first: bool) {
        let mut handles = Vec::with_capacity(participants.len());
        for participant in participants {
            let name = format!("prepare-{}", participant.id());
            handles.push(self.providers.task().spawn_task(&name, async move {
                if recover_first {
                    participant.recover().await;
                }
                participant.prepare().await;
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Phase two: deliver the decision to every `Prepared` participant and
    /// drive its commit-or-abort step, concurrently. `Failed` participants
    /// are logged and skipped, not retried. Blocks until all participant
    /// steps complete.
    pub async fn commit_or_abort(&self, decision: Decision) {
        tracing::info!(%decision, "decision phase started");
        let mut handles = Vec::new();
        for participant in &self.participants {
            match participant.state() {
                ParticipantState::Prepared => {
                    let sender = self.senders.borrow_mut().remove(participant.id());
                    let participant = Rc::clone(participant);
                    let name = format!("decide-{}", participant.id());
                    handles.push(self.providers.task().spawn_task(&name, async move {
                        if let Some(sender) = sender {
                            if let Err(error) = sender.deliver(decision) {
                                tracing::warn!(
                                    participant = %participant.id(),
                                    %error,
                                    "decision delivery rejected"
                                );
                            }
                        }
                        participant.commit_or_abort().await;
                    }));
                }
                ParticipantState::Failed => {
                    tracing::info!(participant = %participant.id(), "skipping, participant failed");
                }
                other => {
                    tracing::debug!(
                        participant = %participant.id(),
                        state = %other,
                        "no decision to deliver in this state"
                    );
                }
            }
        }
        for handle in handles {
            let _ = handle.await;
        }
        tracing::info!("decision phase complete");
    }

    /// Run one full transaction: start, prepare, feed the aggregate vote
    /// into the decision phase. Returns the decision that was applied.
    ///
    /// Calling the phases directly instead allows an externally supplied
    /// decision.
    pub async fn run(&self) -> Decision {
        self.start_transaction();
        let decision = self.prepare().await;
        self.commit_or_abort(decision).await;
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::providers::TokioProviders;

    fn fixture() -> (Coordinator<TokioProviders>, EventLog) {
        let providers = TokioProviders::new();
        let events = EventLog::new();
        let coordinator = Coordinator::new(TransactionConfig::instant(), providers);
        (coordinator, events)
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (mut coordinator, events) = fixture();
        let providers = TokioProviders::new();
        let p1 = Participant::new(
            "P1",
            TransactionConfig::instant(),
            providers.clone(),
            events.clone(),
        );
        let p1_again = Participant::new("P1", TransactionConfig::instant(), providers, events);

        coordinator.register(p1).unwrap();
        assert!(matches!(
            coordinator.register(p1_again),
            Err(TransactionError::DuplicateParticipant(_))
        ));
        assert_eq!(coordinator.participants().len(), 1);
    }

    #[test]
    fn registration_order_is_preserved() {
        let (mut coordinator, events) = fixture();
        let providers = TokioProviders::new();
        for id in ["P3", "P1", "P2"] {
            let p = Participant::new(
                id,
                TransactionConfig::instant(),
                providers.clone(),
                events.clone(),
            );
            coordinator.register(p).unwrap();
        }
        let ids: Vec<_> = coordinator
            .participants()
            .iter()
            .map(|p| p.id().as_str().to_string())
            .collect();
        assert_eq!(ids, ["P3", "P1", "P2"]);
    }
}
