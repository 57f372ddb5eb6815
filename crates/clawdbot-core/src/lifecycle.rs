//! Process lifecycle: exit intents and draining of in-flight work.
//!
//! The relay never manages the OS process. Lifecycle commands and OS signals
//! record an [`ExitIntent`] and cancel the shared token; the binary then
//! drains tracked tasks and exits with the intent's code.

use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tokio_util::task::task_tracker::TrackedFuture;

use clawdbot_types::command::ExitIntent;

/// Added to the failover chain's total timeout to bound the shutdown drain.
pub const DRAIN_MARGIN: Duration = Duration::from_secs(5);

/// Grace period that lets every in-flight request finish or time out.
pub fn drain_grace(total_request_timeout: Duration) -> Duration {
    total_request_timeout + DRAIN_MARGIN
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    cancel: CancellationToken,
    tracker: TaskTracker,
    intent: OnceLock<ExitIntent>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an exit intent and stop accepting new work.
    ///
    /// The first intent wins; later requests return `false` and change nothing.
    pub fn request(&self, intent: ExitIntent) -> bool {
        if self.intent.set(intent).is_err() {
            tracing::debug!(
                requested = %intent,
                current = ?self.intent.get(),
                "Exit already requested"
            );
            return false;
        }
        tracing::info!(%intent, in_flight = self.tracker.len(), "Exit requested");
        self.cancel.cancel();
        true
    }

    pub fn intent(&self) -> Option<ExitIntent> {
        self.intent.get().copied()
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Spawn a unit of work that the drain waits for.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Track a future driven by someone else (e.g. an HTTP handler).
    pub fn track<F: Future>(&self, future: F) -> TrackedFuture<F> {
        self.tracker.track_future(future)
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for tracked work to finish, bounded by `grace`.
    ///
    /// Returns `false` when the grace period elapsed with work still running.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();
        tracing::info!(
            in_flight = self.tracker.len(),
            grace_secs = grace.as_secs(),
            "Draining in-flight work"
        );
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("Drain complete");
                true
            }
            Err(_) => {
                tracing::warn!(
                    remaining = self.tracker.len(),
                    "Drain grace period elapsed with work still in flight"
                );
                false
            }
        }
    }
}
