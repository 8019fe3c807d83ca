//! Provider construction from configuration.

use std::sync::Arc;
use taskpilot_config::{AppConfig, LlmSettings};
use taskpilot_core::error::ProviderError;
use taskpilot_core::{Llm, Provider};
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// Build a provider for resolved LLM settings.
///
/// Local endpoints (Ollama, vLLM on localhost) work without a key; anything
/// else needs one from the config file or the environment.
pub fn build_provider(settings: &LlmSettings) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = provider_name(&settings.base_url);
    let api_key = match (&settings.api_key, is_local(&settings.base_url)) {
        (Some(key), _) => key.clone(),
        (None, true) => String::new(),
        (None, false) => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for {} (set llm.api_key or TASKPILOT_API_KEY)",
                settings.base_url
            )));
        }
    };

    debug!(provider = name, base_url = %settings.base_url, "Building provider");
    Ok(Arc::new(OpenAiCompatProvider::new(
        name,
        settings.base_url.as_str(),
        api_key,
    )))
}

/// Build the LLM gateway for the named `[llm.<name>]` table (or the base table).
pub fn build_llm(config: &AppConfig, name: &str) -> Result<Llm, ProviderError> {
    let settings = config.llm_settings(name);
    let provider = build_provider(&settings)?;
    Ok(Llm::new(provider, settings.model)
        .with_temperature(settings.temperature)
        .with_max_tokens(settings.max_tokens))
}

fn provider_name(base_url: &str) -> &'static str {
    if base_url.contains("api.openai.com") {
        "openai"
    } else if base_url.contains("openrouter.ai") {
        "openrouter"
    } else if base_url.contains(":11434") {
        "ollama"
    } else {
        "custom"
    }
}

fn is_local(base_url: &str) -> bool {
    base_url.contains("localhost") || base_url.contains("127.0.0.1")
}
