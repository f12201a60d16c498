//! Demo binary: one transaction across three participants.
//!
//! Runs with the default config (80% prepare failure, 0-3s delays), so most
//! runs exercise the failure and recovery paths. An optional argv[1] decision
//! literal (`COMMIT` or `ABORT`) overrides the aggregate vote for phase two;
//! unknown literals are treated as ABORT with a warning.

use std::str::FromStr;

use twophase::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = TransactionConfig::default();
    let providers = TokioProviders::new();
    let events = EventLog::new();

    let mut coordinator = Coordinator::new(config.clone(), providers.clone());
    for id in ["P1", "P2", "P3"] {
        let participant = Participant::new(id, config.clone(), providers.clone(), events.clone());
        coordinator.register(participant)?;
    }

    let local = tokio::task::LocalSet::new();
    let decision = local
        .run_until(async {
            match forced_decision() {
                Some(decision) => {
                    coordinator.start_transaction();
                    let vote = coordinator.prepare().await;
                    tracing::info!(%vote, forced = %decision, "overriding aggregate vote");
                    coordinator.commit_or_abort(decision).await;
                    decision
                }
                None => coordinator.run().await,
            }
        })
        .await;

    for participant in coordinator.participants() {
        tracing::info!(
            participant = %participant.id(),
            state = %participant.state(),
            "final state"
        );
    }
    tracing::info!(
        %decision,
        transitions = events.snapshot().len(),
        "transaction finished"
    );
    Ok(())
}

/// Optional decision literal from argv[1].
fn forced_decision() -> Option<Decision> {
    let arg = std::env::args().nth(1)?;
    match Decision::from_str(&arg) {
        Ok(decision) => Some(decision),
        Err(error) => {
            tracing::warn!(%error, "unrecognized decision literal, treating as ABORT");
            Some(Decision::Abort)
        }
    }
}
