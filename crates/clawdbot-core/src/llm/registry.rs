//! Provider registry: the ordered failover list.
//!
//! Loaded once at startup and never mutated; credential rotation requires a
//! restart. Registry order is failover priority and the first entry is
//! always the local primary.

use std::collections::HashSet;
use std::time::Duration;

use clawdbot_types::error::{ConfigError, RegistryError};
use clawdbot_types::llm::ProviderKind;

use super::box_provider::BoxLlmProvider;

/// Ordered, immutable list of configured providers.
#[derive(Debug)]
pub struct ProviderRegistry {
    providers: Vec<BoxLlmProvider>,
}

impl ProviderRegistry {
    /// Build the registry, rejecting an empty list, a non-local primary, and
    /// duplicate identifiers.
    pub fn new(providers: Vec<BoxLlmProvider>) -> Result<Self, ConfigError> {
        let Some(primary) = providers.first() else {
            return Err(ConfigError::invalid(
                "providers",
                "at least one provider must be configured",
            ));
        };
        if primary.config().kind != ProviderKind::Local {
            return Err(ConfigError::invalid(
                "providers",
                format!("primary provider '{}' must be local", primary.id()),
            ));
        }

        let mut seen = HashSet::new();
        for provider in &providers {
            if !seen.insert(provider.id()) {
                return Err(ConfigError::invalid(
                    "providers",
                    format!("duplicate provider id '{}'", provider.id()),
                ));
            }
        }

        tracing::info!(
            count = providers.len(),
            order = %providers.iter().map(|p| p.id()).collect::<Vec<_>>().join(" -> "),
            "Provider registry loaded"
        );

        Ok(Self { providers })
    }

    /// All providers in failover order.
    pub fn list_providers(&self) -> &[BoxLlmProvider] {
        &self.providers
    }

    /// Look up a provider by identifier.
    pub fn get(&self, id: &str) -> Result<&BoxLlmProvider, RegistryError> {
        self.providers
            .iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// The local primary (always the first entry).
    pub fn primary(&self) -> &BoxLlmProvider {
        &self.providers[0]
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Worst-case duration of one routed request: the failover chain tries
    /// providers one after another, so every timeout can fire in turn.
    pub fn total_timeout(&self) -> Duration {
        self.providers
            .iter()
            .map(|p| p.config().request_timeout)
            .sum()
    }
}
