//! Provider health records produced by probes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest liveness observation for one provider.
///
/// One record per provider, overwritten on every probe. No history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub provider_id: String,
    pub reachable: bool,
    /// Round-trip time of the probe (time until failure when unreachable).
    #[serde(rename = "latency_ms", with = "crate::serde_ext::duration_ms")]
    pub latency: Duration,
    pub last_checked: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl HealthRecord {
    pub fn reachable(provider_id: impl Into<String>, latency: Duration) -> Self {
        Self {
            provider_id: provider_id.into(),
            reachable: true,
            latency,
            last_checked: Utc::now(),
            last_error: None,
        }
    }

    pub fn unreachable(
        provider_id: impl Into<String>,
        latency: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            reachable: false,
            latency,
            last_checked: Utc::now(),
            last_error: Some(error.into()),
        }
    }

    /// Status glyph used in operator replies.
    pub fn indicator(&self) -> &'static str {
        if self.reachable { "🟢" } else { "🔴" }
    }

    /// Latency for display; `N/A` when the provider did not answer.
    pub fn latency_display(&self) -> String {
        if self.reachable {
            format!("{}ms", self.latency.as_millis())
        } else {
            "N/A".to_string()
        }
    }
}
