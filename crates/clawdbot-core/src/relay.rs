//! Relay service: the inbound data flow for one message.
//!
//! access gate -> command dispatcher (control verb) or failover router
//! (chat content) -> reply text.

use std::sync::Arc;

use clawdbot_types::command::Command;
use clawdbot_types::inference::{InferenceRequest, InferenceResult};
use clawdbot_types::llm::ProviderKind;
use clawdbot_types::message::InboundMessage;

use crate::access::{AccessGate, DENIED_REPLY};
use crate::dispatch::CommandDispatcher;
use crate::llm::router::FailoverRouter;

/// Reply when every provider failed.
pub const EXHAUSTED_REPLY: &str =
    "❌ Failed to generate response. All LLM providers unavailable.\nCheck /health for details.";

/// Reply to messages that arrive after an exit intent was recorded.
pub const SHUTTING_DOWN_REPLY: &str =
    "⏳ ClawDBot is shutting down. Please resend your message in a moment.";

pub struct RelayService {
    gate: AccessGate,
    dispatcher: CommandDispatcher,
    router: Arc<FailoverRouter>,
}

impl RelayService {
    pub fn new(gate: AccessGate, dispatcher: CommandDispatcher, router: Arc<FailoverRouter>) -> Self {
        Self {
            gate,
            dispatcher,
            router,
        }
    }

    /// Handle one inbound message. Returns `None` when no reply is due.
    ///
    /// Unauthorized principals get the fixed denial before any command or
    /// provider work, and never touch the stats. Logs carry the principal id
    /// only, never message content.
    pub async fn handle(&self, message: &InboundMessage) -> Option<String> {
        if !self.gate.authorize(&message.principal) {
            tracing::info!(principal = %message.principal, "Denied unauthorized principal");
            return Some(DENIED_REPLY.to_string());
        }

        let text = message.text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(command) = Command::parse(text) {
            tracing::info!(principal = %message.principal, %command, "Command received");
            return Some(self.dispatcher.dispatch(command).await);
        }

        let request = InferenceRequest::new(message.principal.clone(), text);
        match self.router.route(&request).await {
            InferenceResult::Success {
                provider_id, text, ..
            } => {
                let via_fallback = self
                    .router
                    .registry()
                    .get(&provider_id)
                    .is_ok_and(|p| p.config().kind == ProviderKind::Fallback);
                if via_fallback {
                    Some(format!("{text}\n\n(via {provider_id})"))
                } else {
                    Some(text)
                }
            }
            InferenceResult::Failure { .. } => Some(EXHAUSTED_REPLY.to_string()),
        }
    }

    /// Reply for a message that will not be handled because the relay is
    /// stopping. Unauthorized principals still only see the denial.
    pub fn rejection(&self, message: &InboundMessage) -> String {
        if self.gate.authorize(&message.principal) {
            SHUTTING_DOWN_REPLY.to_string()
        } else {
            DENIED_REPLY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clawdbot_types::command::ExitIntent;
    use clawdbot_types::llm::LlmError;
    use clawdbot_types::message::Principal;

    use super::*;
    use crate::lifecycle::Lifecycle;
    use crate::llm::health::{DEFAULT_PROBE_TIMEOUT, HealthBoard, HealthProber};
    use crate::stats::StatsTracker;
    use crate::testing::{MockProvider, registry};

    struct Fixture {
        service: RelayService,
        stats: Arc<StatsTracker>,
        lifecycle: Arc<Lifecycle>,
    }

    fn fixture(providers: Vec<MockProvider>) -> Fixture {
        let registry = registry(providers);
        let board = Arc::new(HealthBoard::new());
        let stats = Arc::new(StatsTracker::new());
        let lifecycle = Arc::new(Lifecycle::new());
        let prober = Arc::new(HealthProber::new(
            Arc::clone(&registry),
            Arc::clone(&board),
            DEFAULT_PROBE_TIMEOUT,
        ));
        let router = Arc::new(FailoverRouter::new(registry, board, Arc::clone(&stats)));
        let dispatcher = CommandDispatcher::new(prober, Arc::clone(&stats), Arc::clone(&lifecycle));
        let gate = AccessGate::new([Principal::from("111")]);
        Fixture {
            service: RelayService::new(gate, dispatcher, router),
            stats,
            lifecycle,
        }
    }

    #[tokio::test]
    async fn test_unauthorized_principal_never_reaches_providers() {
        let local = MockProvider::local("LOCAL");
        let calls = local.calls();
        let f = fixture(vec![local]);

        for text in ["hello", "/status", "/shutdown"] {
            let reply = f.service.handle(&InboundMessage::new(222_i64, text)).await;
            assert_eq!(reply.as_deref(), Some(DENIED_REPLY));
        }

        assert_eq!(calls.completions(), 0);
        assert_eq!(calls.probes(), 0);
        let stats = f.stats.snapshot();
        assert_eq!((stats.messages_processed, stats.errors), (0, 0));
        assert!(f.lifecycle.intent().is_none());
    }

    #[tokio::test]
    async fn test_local_reply_has_no_suffix() {
        let f = fixture(vec![MockProvider::local("LOCAL"), MockProvider::fallback("OPENAI")]);
        let reply = f.service.handle(&InboundMessage::new("111", "hi")).await;
        assert_eq!(reply.as_deref(), Some("Hello from LOCAL"));
    }

    #[tokio::test]
    async fn test_fallback_reply_names_provider() {
        let f = fixture(vec![
            MockProvider::local("LOCAL").failing(LlmError::Timeout(Duration::from_secs(60))),
            MockProvider::fallback("OPENAI"),
        ]);
        let reply = f.service.handle(&InboundMessage::new("111", "hi")).await;
        assert_eq!(reply.as_deref(), Some("Hello from OPENAI\n\n(via OPENAI)"));
    }

    #[tokio::test]
    async fn test_exhaustion_reply_and_error_count() {
        let f = fixture(vec![
            MockProvider::local("LOCAL").failing(LlmError::Transport("refused".to_string())),
            MockProvider::fallback("OPENAI").failing(LlmError::AuthenticationFailed),
        ]);
        let reply = f.service.handle(&InboundMessage::new("111", "hi")).await;
        assert_eq!(reply.as_deref(), Some(EXHAUSTED_REPLY));
        assert_eq!(f.stats.snapshot().errors, 1);
    }

    #[tokio::test]
    async fn test_status_after_three_successes_and_one_failure() {
        let f = fixture(vec![MockProvider::local("LOCAL")]);
        for _ in 0..3 {
            f.service.handle(&InboundMessage::new("111", "question")).await;
        }
        f.stats.record_failure();

        let reply = f
            .service
            .handle(&InboundMessage::new("111", "/status"))
            .await
            .unwrap();
        assert!(reply.contains("Messages: 3"));
        assert!(reply.contains("Errors: 1"));
    }

    #[tokio::test]
    async fn test_blank_text_is_ignored() {
        let f = fixture(vec![MockProvider::local("LOCAL")]);
        assert!(f.service.handle(&InboundMessage::new("111", "   ")).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_verb_is_routed_as_prompt() {
        let local = MockProvider::local("LOCAL");
        let calls = local.calls();
        let f = fixture(vec![local]);

        let reply = f.service.handle(&InboundMessage::new("111", "/weather")).await;

        assert_eq!(reply.as_deref(), Some("Hello from LOCAL"));
        assert_eq!(calls.completions(), 1);
    }

    #[tokio::test]
    async fn test_rejection_respects_gate() {
        let f = fixture(vec![MockProvider::local("LOCAL")]);

        assert_eq!(
            f.service.rejection(&InboundMessage::new("111", "hello")),
            SHUTTING_DOWN_REPLY
        );
        assert_eq!(
            f.service.rejection(&InboundMessage::new("999", "hello")),
            DENIED_REPLY
        );
    }

    #[tokio::test]
    async fn test_shutdown_command_sets_intent() {
        let f = fixture(vec![MockProvider::local("LOCAL")]);
        f.service.handle(&InboundMessage::new("111", "/shutdown")).await;
        assert_eq!(f.lifecycle.intent(), Some(ExitIntent::Shutdown));
    }
}
