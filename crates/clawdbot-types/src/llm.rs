//! LLM request/response types for the relay.
//!
//! These types model the data shapes for provider interactions: chat
//! completion requests, responses, provider descriptors, and per-attempt
//! errors.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Role of a message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request to an OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from a provider for a non-streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
}

/// Errors from a single provider attempt.
///
/// Every variant triggers failover to the next provider; the router never
/// retries the same provider within one request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Where a provider runs, which decides its failover priority class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Trusted local hardware reached through a tunnel. Always the primary.
    Local,
    /// Remote API-key based safety net.
    Fallback,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Local => write!(f, "local"),
            ProviderKind::Fallback => write!(f, "fallback"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(ProviderKind::Local),
            "fallback" => Ok(ProviderKind::Fallback),
            other => Err(format!("invalid provider kind: '{other}'")),
        }
    }
}

/// Configuration for a single provider in the failover order.
///
/// Immutable once loaded. The API key is a [`SecretString`] so it never
/// shows up in `Debug` output or logs.
#[derive(Debug)]
pub struct ProviderConfig {
    /// Stable identifier shown to operators (e.g. "LOCAL", "OPENAI").
    pub id: String,
    pub kind: ProviderKind,
    /// Base URL of the OpenAI-compatible API, without a trailing slash.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Upper bound for a single inference call.
    pub request_timeout: Duration,
    /// Bearer credential, fallback providers only.
    pub api_key: Option<SecretString>,
}

impl ProviderConfig {
    /// A local provider without credentials.
    pub fn local(
        id: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ProviderKind::Local,
            base_url: trim_base_url(base_url.into()),
            model: model.into(),
            request_timeout,
            api_key: None,
        }
    }

    /// A remote fallback provider authenticated with a bearer key.
    pub fn fallback(
        id: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ProviderKind::Fallback,
            base_url: trim_base_url(base_url.into()),
            model: model.into(),
            request_timeout,
            api_key,
        }
    }

    /// Scheme and host of the base URL, for operator display without paths
    /// or query strings that may embed tunnel tokens.
    pub fn endpoint_host(&self) -> &str {
        let rest = self
            .base_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.base_url);
        rest.split(['/', '?']).next().unwrap_or(rest)
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
