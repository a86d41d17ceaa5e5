//! Provider router — selects the LLM provider a request names.
//!
//! Handles provider creation from config and routing by `provider_id`.
//! An unknown id falls back to the configured default; the model allow-list
//! (checked upstream at validation time) is the real gate.

use crate::openai_compat::OpenAiCompatProvider;
use aanya_core::provider::ChatProvider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Routes chat turns to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn ChatProvider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider name.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn ChatProvider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn ChatProvider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<Arc<dyn ChatProvider>> {
        self.providers.get(&name.to_lowercase()).cloned()
    }

    /// Resolve the provider for a request's `provider_id`, falling back to
    /// the default when the id is unknown.
    pub fn resolve(&self, provider_id: &str) -> Option<Arc<dyn ChatProvider>> {
        self.get(provider_id).or_else(|| self.default())
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &aanya_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);
    let timeout = Duration::from_secs(config.chat.request_timeout_secs);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.to_lowercase(),
            Arc::new(OpenAiCompatProvider::with_timeout(name, &base_url, &api_key, timeout)),
        );
    }

    // Ensure the default provider exists even if not explicitly configured.
    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(&config.default_provider);
        router.register(
            config.default_provider.to_lowercase(),
            Arc::new(OpenAiCompatProvider::with_timeout(
                &config.default_provider,
                &base_url,
                &api_key,
                timeout,
            )),
        );
    }

    router
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name.to_lowercase().as_str() {
        "groq" => "https://api.groq.com/openai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        other => format!("https://{other}.api.example.com/v1"),
    }
}
