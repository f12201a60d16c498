//! Error types for the transaction simulator.
//!
//! Protocol-expected failures (a participant that cannot vote, a decision
//! timeout) are modeled as participant *state*, never as errors. The variants
//! here cover programmer-error conditions only.

use crate::participant::ParticipantId;
use thiserror::Error;

/// Errors for misuse of the transaction API.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// A participant with this ID is already registered.
    #[error("participant already registered: {0}")]
    DuplicateParticipant(ParticipantId),

    /// A decision was already delivered to this participant in this
    /// transaction.
    #[error("decision already delivered to participant {0}")]
    DecisionAlreadyDelivered(ParticipantId),

    /// The string is not a recognized decision literal.
    #[error("invalid decision literal: {0:?} (expected \"COMMIT\" or \"ABORT\")")]
    InvalidDecision(String),
}
