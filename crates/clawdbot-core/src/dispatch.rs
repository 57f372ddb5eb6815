//! Operator command dispatch.
//!
//! The dispatcher holds no state of its own: every reply is computed from
//! the registry, the health board, the prober and the stats tracker.

use std::sync::Arc;

use clawdbot_types::command::{Command, ExitIntent};
use clawdbot_types::health::HealthRecord;
use clawdbot_types::llm::ProviderKind;

use crate::lifecycle::Lifecycle;
use crate::llm::health::HealthProber;
use crate::llm::registry::ProviderRegistry;
use crate::stats::StatsTracker;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━";
const ERROR_PREVIEW_CHARS: usize = 50;

pub const RESTART_REPLY: &str = "🔄 Restarting ClawDBot...";
pub const SHUTDOWN_REPLY: &str = "🛑 Shutting down ClawDBot...";

pub struct CommandDispatcher {
    registry: Arc<ProviderRegistry>,
    prober: Arc<HealthProber>,
    stats: Arc<StatsTracker>,
    lifecycle: Arc<Lifecycle>,
}

impl CommandDispatcher {
    pub fn new(
        prober: Arc<HealthProber>,
        stats: Arc<StatsTracker>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            registry: Arc::clone(prober.registry()),
            prober,
            stats,
            lifecycle,
        }
    }

    /// Produce the reply text for a command, emitting lifecycle intents for
    /// `restart` and `shutdown`.
    pub async fn dispatch(&self, command: Command) -> String {
        tracing::debug!(%command, "Dispatching command");
        match command {
            Command::Start | Command::Help => welcome_text(),
            Command::Status => self.status_text(),
            Command::Health => self.health_text().await,
            Command::Model => self.model_text(),
            Command::Restart => {
                self.lifecycle.request(ExitIntent::Restart);
                RESTART_REPLY.to_string()
            }
            Command::Shutdown => {
                self.lifecycle.request(ExitIntent::Shutdown);
                SHUTDOWN_REPLY.to_string()
            }
        }
    }

    fn status_text(&self) -> String {
        let stats = self.stats.snapshot();
        let preferred = self.prober.board().preferred(&self.registry);
        format!(
            "📊 Bot Status\n{RULE}\n\
             🟢 State: Running\n\
             ⏱️ Uptime: {}\n\
             💬 Messages: {}\n\
             ⚠️ Errors: {}\n\
             🧠 Active LLM: {}\n\
             📦 Model: {}",
            stats.uptime_display(),
            stats.messages_processed,
            stats.errors,
            preferred.id(),
            preferred.config().model,
        )
    }

    async fn health_text(&self) -> String {
        let records = self.prober.probe_all().await;
        let mut lines = vec![format!("🩺 LLM Health Report\n{RULE}")];
        for (provider, record) in self.registry.list_providers().iter().zip(&records) {
            let status = if record.reachable {
                "🟢 Healthy"
            } else {
                "🔴 Unhealthy"
            };
            lines.push(format!(
                "\n{}\nStatus: {status}\nModel: {}\nLatency: {}",
                provider.id(),
                provider.config().model,
                record.latency_display(),
            ));
            if let (false, Some(error)) = (record.reachable, &record.last_error) {
                lines.push(format!("Error: {}", preview(error)));
            }
        }
        lines.join("\n")
    }

    fn model_text(&self) -> String {
        let board = self.prober.board();
        let current = board.preferred(&self.registry);
        let config = current.config();
        let record = board.latest(current.id());

        let source = match config.kind {
            ProviderKind::Local => "local",
            ProviderKind::Fallback => "fallback",
        };
        let latency = record
            .as_ref()
            .map(HealthRecord::latency_display)
            .unwrap_or_else(|| "N/A".to_string());
        let health = record.as_ref().map(HealthRecord::indicator).unwrap_or("⚪");
        let fallbacks: Vec<&str> = self
            .registry
            .ids()
            .into_iter()
            .filter(|id| *id != current.id())
            .collect();
        let fallbacks = if fallbacks.is_empty() {
            "None".to_string()
        } else {
            fallbacks.join(", ")
        };

        format!(
            "🧠 Active Model Information\n{RULE}\n\
             Source: {} ({source})\n\
             Model: {}\n\
             Endpoint: {}\n\
             Latency: {latency}\n\
             Health: {health}\n\
             Fallbacks: {fallbacks}",
            current.id(),
            config.model,
            config.endpoint_host(),
        )
    }
}

/// Static welcome text listing the operator commands.
pub fn welcome_text() -> String {
    let mut text = format!(
        "🤖 ClawDBot - AI Assistant\n{RULE}\n\
         Send me any message and I'll respond using AI.\n\n\
         📋 Commands:"
    );
    for command in Command::ALL {
        if matches!(command, Command::Start | Command::Help) {
            continue;
        }
        text.push_str(&format!("\n/{command} - {}", command.description()));
    }
    text
}

fn preview(error: &str) -> String {
    if error.chars().count() <= ERROR_PREVIEW_CHARS {
        return error.to_string();
    }
    let head: String = error.chars().take(ERROR_PREVIEW_CHARS).collect();
    format!("{head}...")
}
