//! # Twophase
//!
//! A two-phase commit (2PC) simulator: one coordinator, a fixed set of
//! participants, in-process message passing, probabilistic failure injection,
//! and bounded supervised recovery.
//!
//! The coordinator first fans out the prepare phase to all participants
//! concurrently and barrier-waits, then aggregates the votes (COMMIT only if
//! every participant reached `Prepared`) and fans out the decision the same
//! way. Every suspension point and random draw goes through the provider
//! traits in [`providers`], so the protocol's branches are deterministically
//! testable.
//!
//! ## Participant state machine
//!
//! ```text
//! Preparing -> Prepared              (prepare succeeds)
//! Preparing -> Failed                (prepare fails, probabilistic)
//! Failed    -> Preparing             (supervised recovery)
//! Prepared  -> Committing -> Committed   (COMMIT decision)
//! Prepared  -> Aborting   -> Aborted     (ABORT decision)
//! Prepared  -> Aborted               (decision timeout)
//! ```
//!
//! `Committed` and `Aborted` are terminal. A `Failed` participant is skipped
//! in the decision phase, never retried there.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use twophase::prelude::*;
//!
//! let providers = TokioProviders::new();
//! let events = EventLog::new();
//! let config = TransactionConfig::default();
//!
//! let mut coordinator = Coordinator::new(config.clone(), providers.clone());
//! for id in ["P1", "P2", "P3"] {
//!     let p = Participant::new(id, config.clone(), providers.clone(), events.clone());
//!     coordinator.register(p)?;
//! }
//!
//! // Inside a tokio LocalSet (the crate is single-threaded):
//! let decision = coordinator.run().await;
//! ```
//!
//! ## Module map
//!
//! - [`participant`] / [`coordinator`] - the two protocol roles
//! - [`decision`] - the decision value and its single-assignment delivery slot
//! - [`events`] - observable log of every state transition
//! - [`providers`] - time, task, and randomness injection seams
//! - [`config`] - failure probabilities, delay ranges, timeouts

#![deny(missing_docs)]

pub mod config;
pub mod coordinator;
pub mod decision;
pub mod error;
pub mod events;
pub mod participant;
pub mod prelude;
pub mod providers;

pub use config::TransactionConfig;
pub use coordinator::Coordinator;
pub use decision::{decision_slot, Decision, DecisionReceiver, DecisionSender};
pub use error::TransactionError;
pub use events::{EventLog, TransitionEvent};
pub use participant::{Participant, ParticipantId, ParticipantState};
pub use providers::{
    Elapsed, Providers, RandomProvider, SeededRandomProvider, SimProviders, TaskProvider,
    TimeProvider, TokioProviders, TokioRandomProvider, TokioTaskProvider, TokioTimeProvider,
};
