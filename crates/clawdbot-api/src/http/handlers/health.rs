//! Liveness endpoint for the hosting platform.
//!
//! GET /health - 503 until the first probe cycle has completed, then 200
//! with the counters and the currently preferred provider.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /health (no auth required).
pub async fn get_health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if !state.prober.is_initialized() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "starting" })),
        );
    }

    let stats = state.stats.snapshot();
    let board = state.prober.board();
    let preferred = board.preferred(&state.registry);
    let healthy = board
        .latest(preferred.id())
        .is_some_and(|record| record.reachable);

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "uptime": stats.uptime_display(),
            "messages": stats.messages_processed,
            "errors": stats.errors,
            "llm": {
                "provider": preferred.id(),
                "model": preferred.config().model,
                "healthy": healthy,
            },
        })),
    )
}
