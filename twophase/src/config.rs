//! Configuration for a transaction run.

use std::ops::Range;
use std::time::Duration;

/// Tunables for failure injection, simulated work, and timeouts.
///
/// Held as explicit parameters, never globals: each participant carries its
/// own copy, so tests can give individual participants different failure
/// probabilities within one transaction.
#[derive(Debug, Clone)]
pub struct TransactionConfig {
    /// Probability that a participant fails during prepare (0.0 - 1.0).
    pub failure_probability: f64,

    /// Duration range for simulated prepare work.
    pub prepare_delay: Range<Duration>,

    /// Duration range for simulated commit work (Committing -> Committed).
    pub commit_delay: Range<Duration>,

    /// Duration range for simulated rollback work (Aborting -> Aborted).
    pub abort_delay: Range<Duration>,

    /// Duration range for simulated recovery of a Failed participant.
    pub recovery_delay: Range<Duration>,

    /// How long a Prepared participant waits for the coordinator's decision
    /// before aborting locally.
    pub decision_timeout: Duration,

    /// How many supervised recovery rounds the coordinator runs for Failed
    /// participants before giving up on them. 0 disables recovery.
    pub retry_budget: usize,
}

impl Default for TransactionConfig {
    /// Defaults sized to exercise the failure path: prepare fails 80% of the
    /// time, work delays are 0-3s, recovery takes a flat 2s, and a Prepared
    /// participant waits 5s for a decision.
    fn default() -> Self {
        Self {
            failure_probability: 0.8,
            prepare_delay: Duration::ZERO..Duration::from_secs(3),
            commit_delay: Duration::ZERO..Duration::from_secs(3),
            abort_delay: Duration::ZERO..Duration::from_secs(3),
            recovery_delay: Duration::from_secs(2)..Duration::from_secs(2),
            decision_timeout: Duration::from_secs(5),
            retry_budget: 1,
        }
    }
}

impl TransactionConfig {
    /// Config with zero delays and no failures, for tests that only care
    /// about the state machine.
    pub fn instant() -> Self {
        Self {
            failure_probability: 0.0,
            prepare_delay: Duration::ZERO..Duration::ZERO,
            commit_delay: Duration::ZERO..Duration::ZERO,
            abort_delay: Duration::ZERO..Duration::ZERO,
            recovery_delay: Duration::ZERO..Duration::ZERO,
            decision_timeout: Duration::from_millis(100),
            retry_budget: 0,
        }
    }
}
