//! Task spawning abstraction for single-threaded execution.

use std::future::Future;

/// Provider for spawning local tasks in a single-threaded context.
///
/// Tasks run via `spawn_local`, so per-participant phase work interleaves
/// cooperatively on one thread and participant state never needs locking.
pub trait TaskProvider: Clone {
    /// Spawn a named task that runs on the current thread.
    ///
    /// Requires a `tokio::task::LocalSet` context.
    fn spawn_task<F>(&self, name: &str, future: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = ()> + 'static;
}

/// Tokio-based task provider using `spawn_local`.
#[derive(Clone, Debug, Default)]
pub struct TokioTaskProvider;

impl TaskProvider for TokioTaskProvider {
    fn spawn_task<F>(&self, name: &str, future: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = ()> + 'static,
    {
        let task_name = name.to_string();
        tokio::task::spawn_local(async move {
            tracing::trace!(task = %task_name, "task starting");
            future.await;
            tracing::trace!(task = %task_name, "task completed");
        })
    }
}
