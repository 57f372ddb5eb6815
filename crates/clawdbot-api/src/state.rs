//! Application state wiring the relay services together.
//!
//! AppState holds the shared service instances used by the CLI commands, the
//! console channel and the HTTP handlers. Everything is behind `Arc`, so
//! cloning the state is cheap and every clone sees the same counters, health
//! board and lifecycle.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;

use clawdbot_core::access::AccessGate;
use clawdbot_core::dispatch::CommandDispatcher;
use clawdbot_core::lifecycle::{Lifecycle, drain_grace};
use clawdbot_core::llm::health::{HealthBoard, HealthProber};
use clawdbot_core::llm::registry::ProviderRegistry;
use clawdbot_core::llm::router::FailoverRouter;
use clawdbot_core::relay::RelayService;
use clawdbot_core::stats::StatsTracker;
use clawdbot_infra::config::Settings;
use clawdbot_infra::llm::build_registry;
use clawdbot_types::command::ExitIntent;

use crate::http::extractors::auth::hash_token;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    pub prober: Arc<HealthProber>,
    pub stats: Arc<StatsTracker>,
    pub lifecycle: Arc<Lifecycle>,
    pub relay: Arc<RelayService>,
    pub port: u16,
    pub health_interval: Duration,
    pub restart_exit_code: i32,
    /// SHA-256 (lowercase hex) of the bot token; the token itself is not kept.
    pub token_hash: Arc<str>,
}

impl AppState {
    /// Wire the services from validated settings.
    pub fn init(settings: Settings) -> anyhow::Result<Self> {
        let Settings {
            bot_token,
            allowed_principals,
            port,
            health_interval,
            probe_timeout,
            restart_exit_code,
            providers,
        } = settings;

        let registry = Arc::new(build_registry(providers)?);
        let board = Arc::new(HealthBoard::new());
        let stats = Arc::new(StatsTracker::new());
        let lifecycle = Arc::new(Lifecycle::new());

        let prober = Arc::new(HealthProber::new(
            Arc::clone(&registry),
            Arc::clone(&board),
            probe_timeout,
        ));
        let router = Arc::new(FailoverRouter::new(
            Arc::clone(&registry),
            Arc::clone(&board),
            Arc::clone(&stats),
        ));
        let dispatcher = CommandDispatcher::new(
            Arc::clone(&prober),
            Arc::clone(&stats),
            Arc::clone(&lifecycle),
        );
        let gate = AccessGate::new(allowed_principals);
        tracing::info!(
            allowed = gate.len(),
            providers = registry.len(),
            "Relay services initialized"
        );
        let relay = Arc::new(RelayService::new(gate, dispatcher, router));

        Ok(Self {
            registry,
            prober,
            stats,
            lifecycle,
            relay,
            port,
            health_interval,
            restart_exit_code,
            token_hash: hash_token(bot_token.expose_secret()).into(),
        })
    }

    /// Process exit code for the recorded intent.
    pub fn exit_code(&self) -> i32 {
        exit_code_for(self.lifecycle.intent(), self.restart_exit_code)
    }

    /// Drain in-flight work and return the exit code to terminate with.
    ///
    /// Records a shutdown intent first if nothing has been requested yet, so
    /// a closed transport exits cleanly.
    pub async fn finish(&self) -> i32 {
        self.lifecycle.request(ExitIntent::Shutdown);
        let grace = drain_grace(self.registry.total_timeout());
        if !self.lifecycle.drain(grace).await {
            tracing::warn!("Exiting with requests still in flight");
        }
        self.exit_code()
    }
}

/// Restart exits with the configured code so the supervisor starts a fresh
/// process; shutdown (or no intent at all) exits cleanly.
pub fn exit_code_for(intent: Option<ExitIntent>, restart_exit_code: i32) -> i32 {
    match intent {
        Some(ExitIntent::Restart) => restart_exit_code,
        Some(ExitIntent::Shutdown) | None => 0,
    }
}
