//! OpenAI-compatible provider.
//!
//! One [`OpenAiCompatibleProvider`] serves both the local tunnel endpoint
//! (LM Studio, Ollama, vLLM, llama.cpp server) and remote fallbacks such as
//! the OpenAI API; only the base URL, model and credential differ.

pub mod types;

use secrecy::ExposeSecret;

use clawdbot_core::llm::provider::LlmProvider;
use clawdbot_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderConfig};

use self::types::{ChatCompletionRequest, ChatCompletionResponse};

/// Maximum number of characters of an error body kept in `LlmError::Http`.
pub const ERROR_BODY_LIMIT: usize = 200;

/// Provider for any endpoint speaking the OpenAI chat completions protocol.
///
/// # API Key Security
///
/// The key lives in the [`ProviderConfig`] as a `SecretString` and is only
/// exposed when building the `Authorization` header.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

// OpenAiCompatibleProvider intentionally does NOT derive Debug; the boxed
// provider's Debug prints the id and kind only.

impl OpenAiCompatibleProvider {
    /// Create a provider from its configuration.
    ///
    /// The client-level timeout mirrors the request timeout; the router
    /// applies the same bound around every call.
    pub fn new(config: ProviderConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Build the full API URL for a given path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Attach the bearer credential when one is configured.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.config.request_timeout)
        } else {
            // The URL may carry tunnel credentials; keep it out of error text.
            LlmError::Transport(err.without_url().to_string())
        }
    }

    /// Turn a non-2xx response into an error with a truncated body.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::AuthenticationFailed);
        }
        let body = response.text().await.unwrap_or_default();
        Err(LlmError::Http {
            status: status.as_u16(),
            body: truncate(&body, ERROR_BODY_LIMIT),
        })
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .authorize(self.client.post(self.url("/chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(format!("failed to parse response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                LlmError::MalformedResponse("missing choices[0].message.content".to_string())
            })?;

        Ok(CompletionResponse {
            id: parsed.id.unwrap_or_default(),
            content,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
        })
    }

    async fn probe(&self) -> Result<(), LlmError> {
        let response = self
            .authorize(self.client.get(self.url("/models")))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check_status(response).await?;
        Ok(())
    }
}

/// Keep at most `limit` characters of `text`.
fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
