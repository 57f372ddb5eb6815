//! LLM provider abstractions for the relay.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `ProviderRegistry`: the immutable failover order
//! - `HealthProber` / `HealthBoard`: liveness probes and their latest records
//! - `FailoverRouter`: first-success-wins routing across the registry

pub mod box_provider;
pub mod health;
pub mod provider;
pub mod registry;
pub mod router;
