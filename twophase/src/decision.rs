//! The commit/abort decision and its delivery path.
//!
//! Delivery is a single-assignment slot: the coordinator holds a
//! [`DecisionSender`] and writes it at most once, the participant holds the
//! matching [`DecisionReceiver`] and consumes it at most once. The slot is
//! buffered, so a send never blocks against a participant that is not yet
//! waiting, and a second send is reported as
//! [`TransactionError::DecisionAlreadyDelivered`] instead of silently racing.

use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;

use tokio::sync::oneshot;

use crate::error::TransactionError;
use crate::participant::ParticipantId;

/// Outcome of the prepare phase, broadcast to every participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Finalize the transaction.
    Commit,
    /// Roll the transaction back.
    Abort,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Commit => write!(f, "COMMIT"),
            Decision::Abort => write!(f, "ABORT"),
        }
    }
}

impl FromStr for Decision {
    type Err = TransactionError;

    /// Strict parse: only the exact literals are accepted. Callers that want
    /// the lenient anything-but-COMMIT-is-abort behavior map the error
    /// themselves.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMMIT" => Ok(Decision::Commit),
            "ABORT" => Ok(Decision::Abort),
            other => Err(TransactionError::InvalidDecision(other.to_string())),
        }
    }
}

/// Create a fresh decision slot for one participant and one transaction.
pub fn decision_slot(participant: ParticipantId) -> (DecisionSender, DecisionReceiver) {
    let (tx, rx) = oneshot::channel();
    (
        DecisionSender {
            participant,
            inner: RefCell::new(Some(tx)),
        },
        DecisionReceiver { inner: rx },
    )
}

/// Coordinator-held write half of a decision slot.
pub struct DecisionSender {
    participant: ParticipantId,
    inner: RefCell<Option<oneshot::Sender<Decision>>>,
}

impl DecisionSender {
    /// Deliver the decision. Never blocks.
    ///
    /// A dropped receiver is not an error: the participant already resolved
    /// the transaction locally (timeout) and the decision is moot. A second
    /// delivery is a programmer error.
    pub fn deliver(&self, decision: Decision) -> Result<(), TransactionError> {
        match self.inner.borrow_mut().take() {
            Some(tx) => {
                let _ = tx.send(decision);
                Ok(())
            }
            None => Err(TransactionError::DecisionAlreadyDelivered(
                self.participant.clone(),
            )),
        }
    }

    /// Whether a decision has already been delivered through this sender.
    pub fn is_delivered(&self) -> bool {
        self.inner.borrow().is_none()
    }
}

/// Participant-held read half of a decision slot.
pub struct DecisionReceiver {
    inner: oneshot::Receiver<Decision>,
}

impl DecisionReceiver {
    /// Wait for the decision.
    ///
    /// Returns `None` if the sender was dropped without a delivery, which the
    /// participant treats the same as a timeout: abort on ambiguity.
    pub async fn wait(self) -> Option<Decision> {
        self.inner.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> ParticipantId {
        ParticipantId::from("P1")
    }

    #[test]
    fn parse_is_strict() {
        assert_eq!("COMMIT".parse::<Decision>().unwrap(), Decision::Commit);
        assert_eq!("ABORT".parse::<Decision>().unwrap(), Decision::Abort);
        assert!(matches!(
            "commit".parse::<Decision>(),
            Err(TransactionError::InvalidDecision(_))
        ));
        assert!(matches!(
            "ROLLBACK".parse::<Decision>(),
            Err(TransactionError::InvalidDecision(_))
        ));
    }

    #[tokio::test]
    async fn delivered_decision_is_received() {
        let (tx, rx) = decision_slot(pid());
        assert!(!tx.is_delivered());
        tx.deliver(Decision::Commit).unwrap();
        assert!(tx.is_delivered());
        assert_eq!(rx.wait().await, Some(Decision::Commit));
    }

    #[tokio::test]
    async fn second_delivery_is_rejected() {
        let (tx, _rx) = decision_slot(pid());
        tx.deliver(Decision::Abort).unwrap();
        assert!(matches!(
            tx.deliver(Decision::Commit),
            Err(TransactionError::DecisionAlreadyDelivered(_))
        ));
    }

    #[tokio::test]
    async fn dropped_sender_yields_none() {
        let (tx, rx) = decision_slot(pid());
        drop(tx);
        assert_eq!(rx.wait().await, None);
    }

    #[test]
    fn delivery_to_dropped_receiver_is_not_an_error() {
        let (tx, rx) = decision_slot(pid());
        drop(rx);
        tx.deliver(Decision::Commit).unwrap();
    }
}
