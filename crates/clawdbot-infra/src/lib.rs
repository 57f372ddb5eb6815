//! Infrastructure layer for the ClawDBot relay.
//!
//! Contains the reqwest-based implementation of the [`LlmProvider`] trait
//! defined in `clawdbot-core`, the provider factory, and the configuration
//! loader (TOML file plus environment overrides).
//!
//! [`LlmProvider`]: clawdbot_core::llm::provider::LlmProvider

pub mod config;
pub mod llm;
