//! Provider router — selects the correct LLM provider based on config.

use std::collections::HashMap;
use std::sync::Arc;
use relaybot_config::AppConfig;
use relaybot_core::error::ProviderError;
use relaybot_core::provider::Provider;
use tracing::info;
use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// `gemini` uses the native client; every other name is treated as an
/// OpenAI-compatible endpoint, at its configured `api_url` or a well-known
/// base URL.
pub fn build_from_config(config: &AppConfig) -> Result<ProviderRouter, ProviderError> {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let provider = build_one(name, provider_config.api_url.as_deref(), &api_key)?;
        router.register(name.clone(), provider);
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        let provider = build_one(&config.default_provider, None, &api_key)?;
        router.register(config.default_provider.clone(), provider);
    }

    info!(default = %config.default_provider, providers = ?router.list(), "Providers ready");
    Ok(router)
}

fn build_one(
    name: &str,
    api_url: Option<&str>,
    api_key: &str,
) -> Result<Arc<dyn Provider>, ProviderError> {
    if name == "gemini" {
        let mut p = GeminiProvider::new(api_key);
        if let Some(url) = api_url {
            p = p.with_base_url(url);
        }
        return Ok(Arc::new(p));
    }

    let base_url = match api_url {
        Some(url) => url.to_string(),
        None => default_base_url(name).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider '{name}': set [providers.{name}] api_url"
            ))
        })?,
    };
    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)))
}

/// Get the default base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "gemini-openai" => "https://generativelanguage.googleapis.com/v1beta/openai",
        "openrouter" => "https://openrouter.ai/api/v1",
        "openai" => "https://api.openai.com/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "fireworks" => "https://api.fireworks.ai/inference/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.into())
}
