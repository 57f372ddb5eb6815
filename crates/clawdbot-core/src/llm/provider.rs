//! LlmProvider trait definition.
//!
//! This is the core abstraction that all relay backends implement. Uses
//! RPITIT for `complete` and `probe`; `BoxLlmProvider` wraps it for dynamic
//! dispatch so the registry can hold heterogeneous providers.

use std::future::Future;

use clawdbot_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderConfig};

/// Trait for OpenAI-compatible text-generation backends.
///
/// Implementations live in clawdbot-infra (e.g., `OpenAiCompatibleProvider`).
/// Implementations do not enforce their own deadlines: the router and the
/// prober wrap every call in `tokio::time::timeout`, and dropping the future
/// must release the underlying connection.
pub trait LlmProvider: Send + Sync {
    /// Static descriptor: id, kind, base URL, model and request timeout.
    fn config(&self) -> &ProviderConfig;

    /// Provider identifier (e.g., "LOCAL", "OPENAI").
    fn name(&self) -> &str {
        &self.config().id
    }

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send;

    /// Issue a minimal liveness request (model listing) against the base URL.
    fn probe(&self) -> impl Future<Output = Result<(), LlmError>> + Send;
}
