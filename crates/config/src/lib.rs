//! Configuration loading, validation, and management for Aanya.
//!
//! Loads configuration from `~/.aanya/config.toml` with environment
//! variable overrides for API keys. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.aanya/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fallback API key shared by providers without their own key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider used when a request names an unknown `model_provider`
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Model identifiers a chat request may name. Anything else is rejected
    /// before persistence or a model call.
    #[serde(default = "default_allowed_models")]
    pub allowed_models: Vec<String>,

    /// Chat behavior settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "groq".into()
}

fn default_allowed_models() -> Vec<String> {
    vec![
        "llama3-70b-8192".into(),
        "mixtral-8x7b-32768".into(),
        "llama-3.3-70b-versatile".into(),
        "gpt-4o-mini".into(),
    ]
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("allowed_models", &self.allowed_models)
            .field("chat", &self.chat)
            .field("database", &self.database)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Chat behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// The companion's display name, used as the speaker label for
    /// assistant lines in the rendered history context.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Seconds before an outbound model call times out.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_assistant_name() -> String {
    "Aanya".into()
}
fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path. `sqlite::memory:` runs fully in-process.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "chat_database.db".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    9999
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Per-provider settings.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for this provider (falls back to the top-level key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (`~/.aanya/config.toml`).
    ///
    /// Environment overrides, applied after the file is read:
    /// - `AANYA_API_KEY` fills the shared fallback key
    /// - `<PROVIDER>_API_KEY` (e.g. `GROQ_API_KEY`) fills that provider's key
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Fill API keys from the environment where the file left them unset.
    pub fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("AANYA_API_KEY").ok();
        }
        // Make sure the default provider has an entry so its env key lands.
        self.providers.entry(self.default_provider.clone()).or_default();
        for (name, provider) in self.providers.iter_mut() {
            if provider.api_key.is_none() {
                let var = format!("{}_API_KEY", name.to_uppercase());
                provider.api_key = std::env::var(&var).ok();
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aanya")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_models.is_empty() {
            return Err(ConfigError::ValidationError(
                "allowed_models must name at least one model".into(),
            ));
        }
        if self.chat.assistant_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "chat.assistant_name must not be empty".into(),
            ));
        }
        if self.chat.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "chat.request_timeout_secs must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Is the given model on the allow-list?
    pub fn is_model_allowed(&self, model: &str) -> bool {
        self.allowed_models.iter().any(|m| m == model)
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            allowed_models: default_allowed_models(),
            chat: ChatConfig::default(),
            database: DatabaseConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
