use crate::Cli;
use anyhow::{Context, Result};
use pch_engine::HarnessConfig;
use pch_storage::TomlConfigStore;
use tracing::debug;

/// Settings from `--config`, else `./pch.toml`, else defaults, with command
/// line flags applied on top.
pub fn load(cli: &Cli) -> Result<HarnessConfig> {
    let store = match &cli.config {
        Some(path) => {
            anyhow::ensure!(path.exists(), "Config file {} does not exist", path.display());
            TomlConfigStore::new(path)
        }
        None => TomlConfigStore::in_working_dir(),
    };

    let mut config: HarnessConfig = store
        .load()
        .with_context(|| format!("Failed to load settings from {}", store.path().display()))?;
    config = apply_flags(config, cli);
    config.validate().context("Invalid settings")?;
    debug!("Effective settings: {:?}", config);
    Ok(config)
}

fn apply_flags(mut config: HarnessConfig, cli: &Cli) -> HarnessConfig {
    for dir in &cli.plugin_dirs {
        config = config.with_plugin_dir(dir);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_probe_timeout(secs);
    }
    if let Some(column) = &cli.prompt_column {
        config = config.with_prompt_column(column.clone());
    }
    config
}
