//! Routing logic for the ClawDBot relay.
//!
//! This crate owns every decision the relay makes: which provider answers a
//! prompt, who may talk to the bot, what the operator commands reply, and
//! when the process should drain and exit. It depends only on
//! `clawdbot-types` -- never on `clawdbot-infra` or any HTTP client.

pub mod access;
pub mod channel;
pub mod dispatch;
pub mod lifecycle;
pub mod llm;
pub mod relay;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;
