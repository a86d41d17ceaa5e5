//! `aanya serve` — run the HTTP gateway.

use aanya_config::AppConfig;
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

pub async fn run(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(ref path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            config.apply_env_overrides();
            config
        }
        None => AppConfig::load().context("loading config")?,
    };

    if let Some(port) = port {
        config.gateway.port = port;
    }

    if config.api_key.is_none() && config.providers.values().all(|p| p.api_key.is_none()) {
        info!("No API key configured; set AANYA_API_KEY or a provider key before chatting");
    }

    aanya_gateway::start(config)
        .await
        .map_err(|e| anyhow::anyhow!("gateway failed: {e}"))
}
