//! Operational counters reported by the `status` command.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of the process counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalStats {
    pub started_at: DateTime<Utc>,
    #[serde(rename = "uptime_ms", with = "crate::serde_ext::duration_ms")]
    pub uptime: Duration,
    /// Requests answered by some provider.
    pub messages_processed: u64,
    /// Requests that exhausted every provider.
    pub errors: u64,
}

impl OperationalStats {
    pub fn uptime_display(&self) -> String {
        format_uptime(self.uptime)
    }
}

/// Format a duration as `Hh Mm Ss`.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}h {minutes}m {seconds}s")
}
