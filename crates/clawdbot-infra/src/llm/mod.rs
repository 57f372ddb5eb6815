//! LLM provider implementations.
//!
//! Provides a provider factory ([`create_provider`]) that constructs the
//! concrete provider for a [`ProviderConfig`], and [`build_registry`] which
//! turns the configured failover order into a [`ProviderRegistry`].

pub mod openai_compat;

use clawdbot_core::llm::box_provider::BoxLlmProvider;
use clawdbot_core::llm::registry::ProviderRegistry;
use clawdbot_types::error::ConfigError;
use clawdbot_types::llm::{LlmError, ProviderConfig};

use self::openai_compat::OpenAiCompatibleProvider;

/// Create a [`BoxLlmProvider`] from a [`ProviderConfig`].
///
/// Local and fallback providers both speak the OpenAI-compatible protocol;
/// the kind only decides failover priority and whether a key is sent.
pub fn create_provider(config: ProviderConfig) -> Result<BoxLlmProvider, LlmError> {
    let provider = OpenAiCompatibleProvider::new(config)?;
    Ok(BoxLlmProvider::new(provider))
}

/// Build the registry from provider configs in failover order.
pub fn build_registry(configs: Vec<ProviderConfig>) -> Result<ProviderRegistry, ConfigError> {
    let providers = configs
        .into_iter()
        .map(|config| {
            let id = config.id.clone();
            create_provider(config).map_err(|e| ConfigError::invalid(id, e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    ProviderRegistry::new(providers)
}
