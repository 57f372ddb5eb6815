//! Inference request and tagged result types for the failover router.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::llm::{LlmError, Message};
use crate::message::Principal;

/// A chat prompt to be answered by the first healthy provider.
///
/// Transient: never persisted.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub principal: Principal,
    pub prompt: String,
    /// Earlier turns sent ahead of the prompt, if any.
    pub context: Vec<Message>,
}

impl InferenceRequest {
    pub fn new(principal: impl Into<Principal>, prompt: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            prompt: prompt.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Vec<Message>) -> Self {
        self.context = context;
        self
    }

    /// Context followed by the prompt as a user message.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = self.context.clone();
        messages.push(Message::user(self.prompt.clone()));
        messages
    }
}

/// One failed attempt against a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider_id: String,
    pub error: LlmError,
}

/// Outcome of routing one request through the provider order.
#[derive(Debug, Clone)]
pub enum InferenceResult {
    Success {
        provider_id: String,
        text: String,
        latency: Duration,
    },
    Failure {
        /// Every provider tried, in registry order.
        attempted: Vec<ProviderAttempt>,
        last_error: LlmError,
    },
}

impl InferenceResult {
    pub fn is_success(&self) -> bool {
        matches!(self, InferenceResult::Success { .. })
    }

    /// Identifiers of the attempted providers (empty on success).
    pub fn attempted_ids(&self) -> Vec<&str> {
        match self {
            InferenceResult::Success { .. } => Vec::new(),
            InferenceResult::Failure { attempted, .. } => {
                attempted.iter().map(|a| a.provider_id.as_str()).collect()
            }
        }
    }
}

/// Serializable summary of an [`InferenceResult`] for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceSummary {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempted: Vec<String>,
}

impl From<&InferenceResult> for InferenceSummary {
    fn from(result: &InferenceResult) -> Self {
        match result {
            InferenceResult::Success {
                provider_id,
                latency,
                ..
            } => Self {
                success: true,
                provider_id: Some(provider_id.clone()),
                latency_ms: Some(latency.as_millis() as u64),
                attempted: Vec::new(),
            },
            InferenceResult::Failure { attempted, .. } => Self {
                success: false,
                provider_id: None,
                latency_ms: None,
                attempted: attempted.iter().map(|a| a.provider_id.clone()).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;

    #[test]
    fn test_messages_appends_prompt_after_context() {
        let request = InferenceRequest::new("1", "what now?").with_context(vec![Message {
            role: MessageRole::System,
            content: "be brief".to_string(),
        }]);
        let messages = request.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1], Message::user("what now?"));
    }

    #[test]
    fn test_failure_summary_lists_attempts_in_order() {
        let result = InferenceResult::Failure {
            attempted: vec![
                ProviderAttempt {
                    provider_id: "LOCAL".to_string(),
                    error: LlmError::Timeout(Duration::from_secs(60)),
                },
                ProviderAttempt {
                    provider_id: "OPENAI".to_string(),
                    error: LlmError::AuthenticationFailed,
                },
            ],
            last_error: LlmError::AuthenticationFailed,
        };
        assert_eq!(result.attempted_ids(), vec!["LOCAL", "OPENAI"]);

        let summary = InferenceSummary::from(&result);
        assert!(!summary.success);
        assert_eq!(summary.attempted, vec!["LOCAL", "OPENAI"]);
    }
}
