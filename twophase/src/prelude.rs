//! Common imports for the transaction simulator.
//!
//! This module provides a convenient prelude for importing commonly used types and traits.

pub use crate::config::TransactionConfig;
pub use crate::coordinator::Coordinator;
pub use crate::decision::Decision;
pub use crate::error::TransactionError;
pub use crate::events::{EventLog, TransitionEvent};
pub use crate::participant::{Participant, ParticipantId, ParticipantState};
pub use crate::providers::{
    Providers, RandomProvider, SimProviders, TaskProvider, TimeProvider, TokioProviders,
};

// Re-export commonly used external types
pub use std::rc::Rc;
pub use std::time::Duration;

/// Result type for transaction API misuse.
pub type Result<T> = std::result::Result<T, TransactionError>;
