//! Shared domain types for the ClawDBot relay.
//!
//! Providers, health records, inference requests/results, principals,
//! operator commands, operational stats, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, secrecy.

pub mod command;
pub mod error;
pub mod health;
pub mod inference;
pub mod llm;
pub mod message;
pub mod serde_ext;
pub mod stats;
