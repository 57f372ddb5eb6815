//! Shared fixtures for handler and CLI tests.

use std::time::Duration;

use secrecy::SecretString;

use clawdbot_infra::config::Settings;
use clawdbot_types::llm::ProviderConfig;
use clawdbot_types::message::Principal;

pub const BOT_TOKEN: &str = "123456:test-bot-token";
pub const ALLOWED: &str = "42";

/// Settings with a single local provider at `base_url`.
pub fn settings(base_url: &str) -> Settings {
    Settings {
        bot_token: SecretString::from(BOT_TOKEN.to_string()),
        allowed_principals: vec![Principal::from(ALLOWED)],
        port: 0,
        health_interval: Duration::from_secs(60),
        probe_timeout: Duration::from_secs(2),
        restart_exit_code: 75,
        providers: vec![ProviderConfig::local(
            "LOCAL",
            base_url,
            "llama3",
            Duration::from_secs(5),
        )],
    }
}

/// Body of a successful OpenAI-compatible completion.
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "model": "llama3",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}
