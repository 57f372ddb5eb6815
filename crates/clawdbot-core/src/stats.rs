//! Operational state tracker.
//!
//! Owned explicitly and shared by `Arc`; counters are atomics so concurrent
//! requests never lose an update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use clawdbot_types::stats::OperationalStats;

/// Process-lifetime counters for the `status` command.
#[derive(Debug)]
pub struct StatsTracker {
    started_at: DateTime<Utc>,
    started: Instant,
    messages_processed: AtomicU64,
    errors: AtomicU64,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            messages_processed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// A request was answered by `provider_id`.
    pub fn record_success(&self, provider_id: &str, latency: Duration) {
        let total = self.messages_processed.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            provider = %provider_id,
            latency_ms = latency.as_millis() as u64,
            messages_processed = total,
            "Recorded success"
        );
    }

    /// A request exhausted every provider.
    pub fn record_failure(&self) {
        let total = self.errors.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(errors = total, "Recorded failure");
    }

    pub fn snapshot(&self) -> OperationalStats {
        OperationalStats {
            started_at: self.started_at,
            uptime: self.started.elapsed(),
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
