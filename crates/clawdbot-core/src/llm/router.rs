//! Ordered failover routing.
//!
//! Providers are tried strictly in registry order, once each. The local
//! primary is always preferred when it answers; remote fallbacks only see
//! traffic the primary failed. There is no same-provider retry, so repeated
//! transient failures surface as `InferenceResult::Failure`.

use std::sync::Arc;

use tokio::time::Instant;

use clawdbot_types::health::HealthRecord;
use clawdbot_types::inference::{InferenceRequest, InferenceResult, ProviderAttempt};
use clawdbot_types::llm::{CompletionRequest, LlmError};

use super::box_provider::BoxLlmProvider;
use super::health::HealthBoard;
use super::registry::ProviderRegistry;
use crate::stats::StatsTracker;

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Routes inference requests through the provider order.
pub struct FailoverRouter {
    registry: Arc<ProviderRegistry>,
    board: Arc<HealthBoard>,
    stats: Arc<StatsTracker>,
    max_tokens: u32,
    temperature: f64,
}

impl FailoverRouter {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        board: Arc<HealthBoard>,
        stats: Arc<StatsTracker>,
    ) -> Self {
        Self {
            registry,
            board,
            stats,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Route a request, returning the first success or the ordered list of
    /// failed attempts.
    ///
    /// Records exactly one stats outcome per call.
    pub async fn route(&self, request: &InferenceRequest) -> InferenceResult {
        let messages = request.messages();
        let mut attempted: Vec<ProviderAttempt> = Vec::with_capacity(self.registry.len());

        for provider in self.registry.list_providers() {
            let completion = CompletionRequest {
                model: provider.config().model.clone(),
                messages: messages.clone(),
                max_tokens: self.max_tokens,
                temperature: Some(self.temperature),
            };

            let start = Instant::now();
            let outcome = self.attempt(provider, &completion).await;
            let latency = start.elapsed();
            let id = provider.id();

            match outcome {
                Ok(text) => {
                    self.board.update(HealthRecord::reachable(id, latency));
                    self.stats.record_success(id, latency);
                    if !attempted.is_empty() {
                        tracing::info!(
                            provider = %id,
                            failed = attempted.len(),
                            "Request served by fallback provider"
                        );
                    }
                    return InferenceResult::Success {
                        provider_id: id.to_string(),
                        text,
                        latency,
                    };
                }
                Err(err) => {
                    tracing::warn!(
                        provider = %id,
                        error = %err,
                        latency_ms = latency.as_millis() as u64,
                        "Provider failed, trying next in order"
                    );
                    self.board
                        .update(HealthRecord::unreachable(id, latency, err.to_string()));
                    attempted.push(ProviderAttempt {
                        provider_id: id.to_string(),
                        error: err,
                    });
                }
            }
        }

        self.stats.record_failure();
        let last_error = attempted
            .last()
            .map(|a| a.error.clone())
            .unwrap_or_else(|| LlmError::Transport("no providers configured".to_string()));
        tracing::error!(
            attempted = attempted.len(),
            error = %last_error,
            "All providers exhausted"
        );
        InferenceResult::Failure {
            attempted,
            last_error,
        }
    }

    /// One attempt bounded by the provider's request timeout. A fired
    /// timeout drops the in-flight future, which closes its connection.
    async fn attempt(
        &self,
        provider: &BoxLlmProvider,
        completion: &CompletionRequest,
    ) -> Result<String, LlmError> {
        let timeout = provider.config().request_timeout;
        match tokio::time::timeout(timeout, provider.complete(completion)).await {
            Ok(Ok(response)) => Ok(response.content),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(LlmError::Timeout(timeout)),
        }
    }
}
