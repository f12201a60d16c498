//! Random number generation provider abstraction.
//!
//! Failure injection and simulated work delays draw from a [`RandomProvider`]
//! rather than global random state, so tests can force either branch of the
//! prepare phase deterministically.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;

/// Provider trait for the randomness the transaction simulation needs.
///
/// Only `random_ratio` is required; the probability and duration helpers are
/// derived from it, which keeps test doubles down to a single method.
pub trait RandomProvider: Clone {
    /// Generate a random f64 in `[0.0, 1.0)`.
    fn random_ratio(&self) -> f64;

    /// Generate a random bool with the given probability of being true.
    ///
    /// The probability should be between 0.0 and 1.0; 0.0 never fires and
    /// 1.0 always fires.
    fn random_bool(&self, probability: f64) -> bool {
        self.random_ratio() < probability
    }

    /// Sample a duration uniformly from the range (exclusive upper bound).
    ///
    /// An empty range yields `range.start`, so a fixed delay can be expressed
    /// as `d..d` without panicking.
    fn random_duration(&self, range: Range<Duration>) -> Duration {
        if range.end <= range.start {
            return range.start;
        }
        let span = range.end - range.start;
        range.start + span.mul_f64(self.random_ratio())
    }
}

/// Production random provider using the thread-local RNG.
///
/// Uses `rand::rng()` (thread-local, non-cryptographic), which is plenty for
/// simulated failures and delays.
#[derive(Clone, Default)]
pub struct TokioRandomProvider;

impl TokioRandomProvider {
    /// Create a new production random provider.
    pub fn new() -> Self {
        Self
    }
}

// Thread-local RNG for TokioRandomProvider
thread_local! {
    static RNG: RefCell<rand::rngs::ThreadRng> = RefCell::new(rand::rng());
}

impl RandomProvider for TokioRandomProvider {
    fn random_ratio(&self) -> f64 {
        RNG.with(|rng| rng.borrow_mut().random())
    }
}

/// Deterministic random provider seeded per run.
///
/// Uses ChaCha8 so the same seed always produces the same transaction
/// outcome, making failed runs reproducible from their seed alone.
#[derive(Clone)]
pub struct SeededRandomProvider {
    rng: Rc<RefCell<ChaCha8Rng>>,
    seed: u64,
}

impl SeededRandomProvider {
    /// Create a provider whose entire sequence is determined by `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Rc::new(RefCell::new(ChaCha8Rng::seed_from_u64(seed))),
            seed,
        }
    }

    /// The seed this provider was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomProvider for SeededRandomProvider {
    fn random_ratio(&self) -> f64 {
        self.rng.borrow_mut().random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_provider_is_reproducible() {
        let a = SeededRandomProvider::from_seed(42);
        let b = SeededRandomProvider::from_seed(42);
        for _ in 0..32 {
            assert_eq!(a.random_ratio(), b.random_ratio());
        }
    }

    #[test]
    fn probability_extremes_are_exact() {
        let random = SeededRandomProvider::from_seed(7);
        for _ in 0..64 {
            assert!(!random.random_bool(0.0));
            assert!(random.random_bool(1.0));
        }
    }

    #[test]
    fn empty_duration_range_yields_start() {
        let random = SeededRandomProvider::from_seed(7);
        let fixed = Duration::from_secs(2);
        assert_eq!(random.random_duration(fixed..fixed), fixed);
    }

    #[test]
    fn sampled_duration_stays_in_range() {
        let random = SeededRandomProvider::from_seed(7);
        let range = Duration::from_millis(10)..Duration::from_millis(50);
        for _ in 0..64 {
            let d = random.random_duration(range.clone());
            assert!(d >= range.start && d < range.end, "sampled {d:?}");
        }
    }
}
