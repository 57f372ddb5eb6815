//! Bot token authentication extractor.
//!
//! Transport adapters authenticate with `Authorization: Bearer <bot token>`.
//! The presented token is SHA-256 hashed and compared against the hash kept
//! in [`AppState`]; the plaintext token is never stored in the state.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated request marker. Extracting this validates the bot token.
pub struct Authenticated;

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts)?;

        if hash_token(token) == *state.token_hash {
            Ok(Authenticated)
        } else {
            Err(AppError::Unauthorized("Invalid bot token.".to_string()))
        }
    }
}

fn extract_bearer(parts: &Parts) -> Result<&str, AppError> {
    let Some(auth) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(AppError::Unauthorized(
            "Missing token. Provide it via 'Authorization: Bearer <token>'.".to_string(),
        ));
    };
    let auth_str = auth.to_str().map_err(|_| {
        AppError::Unauthorized("Invalid Authorization header encoding".to_string())
    })?;
    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| AppError::Unauthorized("Expected a Bearer token".to_string()))
}

/// Compute SHA-256 hash of a token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}
