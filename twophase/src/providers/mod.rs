//! Provider traits for time, task spawning, and randomness.
//!
//! The transaction state machines are written against these traits so that
//! every suspension point and every random draw can be controlled in tests.
//! [`Providers`] bundles the three into one type parameter, eliminating the
//! `<T, TP, R>` explosion downstream code would otherwise carry.

mod random;
mod task;
mod time;

pub use random::{RandomProvider, SeededRandomProvider, TokioRandomProvider};
pub use task::{TaskProvider, TokioTaskProvider};
pub use time::{Elapsed, TimeProvider, TokioTimeProvider};

/// Bundle of all provider types for a runtime environment.
///
/// Associated types preserve concrete provider types at compile time; there
/// is no runtime dispatch.
pub trait Providers: Clone + 'static {
    /// Time provider type for sleep, timeout, and time queries.
    type Time: TimeProvider + Clone + 'static;

    /// Task provider type for spawning local tasks.
    type Task: TaskProvider + Clone + 'static;

    /// Random provider type for failure injection and delay sampling.
    type Random: RandomProvider + Clone + 'static;

    /// Get the time provider instance.
    fn time(&self) -> &Self::Time;

    /// Get the task provider instance.
    fn task(&self) -> &Self::Task;

    /// Get the random provider instance.
    fn random(&self) -> &Self::Random;
}

/// Production providers: Tokio time and tasks, thread-local randomness.
#[derive(Clone, Default)]
pub struct TokioProviders {
    time: TokioTimeProvider,
    task: TokioTaskProvider,
    random: TokioRandomProvider,
}

impl TokioProviders {
    /// Create a new production provider bundle.
    pub fn new() -> Self {
        Self {
            time: TokioTimeProvider::new(),
            task: TokioTaskProvider,
            random: TokioRandomProvider::new(),
        }
    }
}

impl Providers for TokioProviders {
    type Time = TokioTimeProvider;
    type Task = TokioTaskProvider;
    type Random = TokioRandomProvider;

    fn time(&self) -> &Self::Time {
        &self.time
    }

    fn task(&self) -> &Self::Task {
        &self.task
    }

    fn random(&self) -> &Self::Random {
        &self.random
    }
}

/// Deterministic providers: Tokio time and tasks, seeded randomness.
///
/// The same seed reproduces the same sequence of failure rolls and delay
/// samples, so a run that exposed a bug can be replayed exactly.
#[derive(Clone)]
pub struct SimProviders {
    time: TokioTimeProvider,
    task: TokioTaskProvider,
    random: SeededRandomProvider,
}

impl SimProviders {
    /// Create a deterministic provider bundle from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            time: TokioTimeProvider::new(),
            task: TokioTaskProvider,
            random: SeededRandomProvider::from_seed(seed),
        }
    }
}

impl Providers for SimProviders {
    type Time = TokioTimeProvider;
    type Task = TokioTaskProvider;
    type Random = SeededRandomProvider;

    fn time(&self) -> &Self::Time {
        &self.time
    }

    fn task(&self) -> &Self::Task {
        &self.task
    }

    fn random(&self) -> &Self::Random {
        &self.random
    }
}
