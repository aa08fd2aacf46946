//! Client-side deadlines for remote I/O.
//!
//! The I/O future is spawned as its own task and raced against a fixed budget. When the
//! budget runs out first the task is detached, not aborted: it may still complete later,
//! and whatever it returns is dropped.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// How a deadline-bounded call settled.
#[derive(Debug)]
pub enum Settled<T> {
    /// The I/O finished within the budget.
    Completed(T),
    /// The budget elapsed first; the I/O keeps running detached.
    TimedOut,
    /// The I/O task panicked.
    Panicked,
}

/// Run `io` with at most `budget` of waiting.
pub async fn run_with_deadline<F, T>(budget: Duration, io: F) -> Settled<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handle: JoinHandle<T> = tokio::spawn(io);
    match tokio::time::timeout(budget, handle).await {
        Ok(Ok(value)) => Settled::Completed(value),
        Ok(Err(join_err)) => {
            tracing::error!("Deadline-bounded task failed: {}", join_err);
            Settled::Panicked
        }
        // Dropping a JoinHandle detaches the task.
        Err(_) => Settled::TimedOut,
    }
}
