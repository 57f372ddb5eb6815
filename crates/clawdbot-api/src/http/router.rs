//! Axum router configuration with middleware.
//!
//! `/` and `/health` serve the hosting platform's liveness checks, `/status`
//! the operator view, and `/api/v1/messages` the transport adapters.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

pub const BANNER: &str = "ClawDBot is running. GET /health for status.";

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new().route("/messages", post(handlers::message::post_message));

    Router::new()
        .route("/", get(banner))
        .route("/health", get(handlers::health::get_health))
        .route("/status", get(handlers::status::get_status))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn banner() -> &'static str {
    BANNER
}
