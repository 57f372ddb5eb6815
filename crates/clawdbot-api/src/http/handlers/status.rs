//! GET /status - counters, preferred provider and the latest health board.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use clawdbot_types::health::HealthRecord;
use clawdbot_types::llm::ProviderKind;
use clawdbot_types::stats::OperationalStats;

use crate::http::response::{ApiResponse, request_id};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusData {
    pub stats: OperationalStats,
    pub uptime: String,
    pub preferred: PreferredProvider,
    /// Latest probe result per provider, failover order. Providers that were
    /// never observed are omitted.
    pub providers: Vec<HealthRecord>,
    pub shutting_down: bool,
}

#[derive(Debug, Serialize)]
pub struct PreferredProvider {
    pub id: String,
    pub kind: ProviderKind,
    pub model: String,
    pub endpoint: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<StatusData>> {
    let start = Instant::now();
    let board = state.prober.board();
    let preferred = board.preferred(&state.registry);
    let config = preferred.config();
    let stats = state.stats.snapshot();

    let data = StatusData {
        uptime: stats.uptime_display(),
        stats,
        preferred: PreferredProvider {
            id: config.id.clone(),
            kind: config.kind,
            model: config.model.clone(),
            endpoint: config.endpoint_host().to_string(),
        },
        providers: board.snapshot(&state.registry),
        shutting_down: state.lifecycle.is_cancelled(),
    };

    let elapsed = start.elapsed().as_millis() as u64;
    Json(
        ApiResponse::success(data, request_id(), elapsed)
            .with_link("self", "/status")
            .with_link("health", "/health"),
    )
}
