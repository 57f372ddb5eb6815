//! Provider liveness probing.
//!
//! The `HealthBoard` keeps the latest `HealthRecord` per provider (no history).
//! The `HealthProber` fills it from on-demand probes, the periodic background
//! task, and the failover router's passive observations.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use clawdbot_types::health::HealthRecord;
use clawdbot_types::llm::LlmError;

use super::box_provider::BoxLlmProvider;
use super::registry::ProviderRegistry;

/// Default bound for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Latest health record per provider id.
#[derive(Debug, Default)]
pub struct HealthBoard {
    records: DashMap<String, HealthRecord>,
}

impl HealthBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the provider's record.
    pub fn update(&self, record: HealthRecord) {
        self.records.insert(record.provider_id.clone(), record);
    }

    pub fn latest(&self, provider_id: &str) -> Option<HealthRecord> {
        self.records.get(provider_id).map(|r| r.value().clone())
    }

    /// Records for every probed provider, in registry order.
    pub fn snapshot(&self, registry: &ProviderRegistry) -> Vec<HealthRecord> {
        registry
            .list_providers()
            .iter()
            .filter_map(|p| self.latest(p.id()))
            .collect()
    }

    /// The provider the router would try first with current knowledge.
    ///
    /// First provider in registry order whose latest record is reachable or
    /// that has not been observed yet. When every provider is known to be
    /// down the primary is reported.
    pub fn preferred<'a>(&self, registry: &'a ProviderRegistry) -> &'a BoxLlmProvider {
        registry
            .list_providers()
            .iter()
            .find(|p| {
                self.records
                    .get(p.id())
                    .is_none_or(|record| record.reachable)
            })
            .unwrap_or_else(|| registry.primary())
    }
}

/// Probes providers against the health board.
///
/// A provider is never probed concurrently with itself: each provider has an
/// async mutex held for the whole probe, so an overlapping caller waits for
/// the in-flight probe and then runs its own.
pub struct HealthProber {
    registry: Arc<ProviderRegistry>,
    board: Arc<HealthBoard>,
    probe_timeout: Duration,
    in_flight: HashMap<String, Mutex<()>>,
    cycles: AtomicU64,
}

impl HealthProber {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        board: Arc<HealthBoard>,
        probe_timeout: Duration,
    ) -> Self {
        let in_flight = registry
            .list_providers()
            .iter()
            .map(|p| (p.id().to_string(), Mutex::new(())))
            .collect();
        Self {
            registry,
            board,
            probe_timeout,
            in_flight,
            cycles: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn board(&self) -> &Arc<HealthBoard> {
        &self.board
    }

    /// Probe bound for a provider: the probe timeout, capped by the
    /// provider's own request timeout.
    pub fn timeout_for(&self, provider: &BoxLlmProvider) -> Duration {
        self.probe_timeout.min(provider.config().request_timeout)
    }

    /// Probe one provider and record the outcome on the board.
    pub async fn probe(&self, provider: &BoxLlmProvider) -> HealthRecord {
        let _guard = match self.in_flight.get(provider.id()) {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let id = provider.id();
        let timeout = self.timeout_for(provider);
        let start = Instant::now();
        let outcome = match tokio::time::timeout(timeout, provider.probe()).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(timeout)),
        };
        let latency = start.elapsed();

        let record = match outcome {
            Ok(()) => {
                tracing::debug!(
                    provider = %id,
                    latency_ms = latency.as_millis() as u64,
                    "Probe succeeded"
                );
                HealthRecord::reachable(id, latency)
            }
            Err(err) => {
                tracing::warn!(provider = %id, error = %err, "Probe failed");
                HealthRecord::unreachable(id, latency, err.to_string())
            }
        };

        self.board.update(record.clone());
        record
    }

    /// Probe every provider concurrently and return one record per provider,
    /// in registry order.
    pub async fn probe_all(&self) -> Vec<HealthRecord> {
        let records = join_all(
            self.registry
                .list_providers()
                .iter()
                .map(|provider| self.probe(provider)),
        )
        .await;
        self.cycles.fetch_add(1, Ordering::SeqCst);
        records
    }

    /// Number of completed `probe_all` cycles.
    pub fn completed_cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Whether at least one full probe cycle has completed.
    pub fn is_initialized(&self) -> bool {
        self.completed_cycles() > 0
    }

    /// Probe all providers every `interval` until `cancel` fires.
    ///
    /// The first cycle runs immediately and doubles as the startup check.
    pub fn spawn_periodic(
        self: Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Health prober stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let records = self.probe_all().await;
                        let reachable = records.iter().filter(|r| r.reachable).count();
                        tracing::info!(
                            reachable,
                            total = records.len(),
                            cycle = self.completed_cycles(),
                            "Health check cycle complete"
                        );
                    }
                }
            }
        })
    }
}
