//! Time provider abstraction.
//!
//! All sleeping and timeout handling in the transaction state machines goes
//! through [`TimeProvider`], so tests can shrink the simulated delays and
//! timeouts without touching the protocol code.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A bounded wait expired before the inner future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out")]
pub struct Elapsed;

/// Provider trait for time operations.
///
/// Implementations decide what "time" means: the production provider uses
/// Tokio's clock, and tests can pause or shrink it freely because every
/// suspension point in the protocol funnels through here.
#[async_trait(?Send)]
pub trait TimeProvider: Clone {
    /// Sleep for the specified duration.
    async fn sleep(&self, duration: Duration);

    /// Elapsed time since the provider was created.
    ///
    /// Used to timestamp transition events, not for scheduling.
    fn now(&self) -> Duration;

    /// Run a future with a timeout.
    ///
    /// Returns `Ok(result)` if the future completes within the timeout,
    /// or `Err(Elapsed)` if it does not.
    async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, Elapsed>
    where
        F: std::future::Future<Output = T>;
}

/// Real time provider using Tokio's time facilities.
#[derive(Debug, Clone)]
pub struct TokioTimeProvider {
    /// Start time for calculating elapsed duration
    start_time: std::time::Instant,
}

impl TokioTimeProvider {
    /// Create a new Tokio time provider.
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
        }
    }
}

impl Default for TokioTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl TimeProvider for TokioTimeProvider {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Duration {
        self.start_time.elapsed()
    }

    async fn timeout<F, T>(&self, duration: Duration, future: F) -> Result<T, Elapsed>
    where
        F: std::future::Future<Output = T>,
    {
        match tokio::time::timeout(duration, future).await {
            Ok(result) => Ok(result),
            Err(_) => Err(Elapsed),
        }
    }
}
