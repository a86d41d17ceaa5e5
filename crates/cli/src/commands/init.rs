//! `aanya init` — write a starter config file.

use aanya_config::AppConfig;
use anyhow::Context;

pub fn run() -> anyhow::Result<()> {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");

    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating config directory {}", dir.display()))?;
    std::fs::write(&path, AppConfig::default_toml())
        .with_context(|| format!("writing {}", path.display()))?;

    println!("Wrote starter config to {}", path.display());
    println!("Set an API key (e.g. GROQ_API_KEY) and run `aanya serve`.");
    Ok(())
}
