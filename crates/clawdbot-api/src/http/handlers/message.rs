//! Inbound message endpoint for transport adapters.
//!
//! POST /api/v1/messages - relay one `(principal, text)` pair and return the
//! reply. Authorization of the principal happens inside the relay, so an
//! unknown principal gets the denial text rather than an HTTP error; the
//! bearer token only proves the caller is the configured transport.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use clawdbot_types::message::InboundMessage;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::{ApiResponse, request_id};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub principal: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageReply {
    pub principal: String,
    /// `None` when the message needs no reply (blank text).
    pub reply: Option<String>,
}

pub async fn post_message(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(body): Json<PostMessageRequest>,
) -> Result<Json<ApiResponse<MessageReply>>, AppError> {
    let start = Instant::now();

    if body.principal.trim().is_empty() {
        return Err(AppError::Validation("principal must not be empty".to_string()));
    }
    if state.lifecycle.is_cancelled() {
        return Err(AppError::Unavailable(
            "Relay is shutting down; retry after restart.".to_string(),
        ));
    }

    let message = InboundMessage::new(body.principal, body.text);
    let reply = state.lifecycle.track(state.relay.handle(&message)).await;

    let elapsed = start.elapsed().as_millis() as u64;
    let data = MessageReply {
        principal: message.principal.to_string(),
        reply,
    };
    Ok(Json(
        ApiResponse::success(data, request_id(), elapsed).with_link("status", "/status"),
    ))
}
