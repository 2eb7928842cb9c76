use pch_plugins::SandboxConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Harness settings, usually read from `pch.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Deadline for the single probe conversion
    pub probe_timeout_secs: f64,
    /// Text sent during probing
    pub probe_text: String,
    /// Deadline for each batch or single-prompt conversion
    pub cell_timeout_secs: f64,
    /// Register the built-in converters before scanning plugin directories
    pub include_builtins: bool,
    /// Directories scanned for `*_converter.lua` / `*_converter.wasm`
    pub plugin_dirs: Vec<PathBuf>,
    /// Base for the shim's seed, db-data and dataset directories
    pub data_dir: PathBuf,
    pub prompt_column: String,
    /// Failure reasons printed in verbose mode
    pub max_failures_shown: usize,
    pub sandbox: SandboxSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 5.0,
            probe_text: "test".to_string(),
            cell_timeout_secs: 30.0,
            include_builtins: true,
            plugin_dirs: Vec::new(),
            data_dir: PathBuf::from("."),
            prompt_column: "prompt".to_string(),
            max_failures_shown: 20,
            sandbox: SandboxSettings::default(),
        }
    }
}

/// Limits for script and WASM converters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxSettings {
    pub script_timeout_secs: f64,
    pub memory_limit_bytes: usize,
    pub instruction_limit: Option<u64>,
    pub wasm_fuel: u64,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        let base = SandboxConfig::default();
        Self {
            script_timeout_secs: base.timeout.as_secs_f64(),
            memory_limit_bytes: base.memory_limit,
            instruction_limit: base.instruction_limit,
            wasm_fuel: base.wasm_fuel,
        }
    }
}

impl SandboxSettings {
    pub fn to_sandbox_config(&self) -> SandboxConfig {
        SandboxConfig {
            timeout: Duration::from_secs_f64(self.script_timeout_secs),
            memory_limit: self.memory_limit_bytes,
            instruction_limit: self.instruction_limit,
            wasm_fuel: self.wasm_fuel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be a positive, representable number of seconds, got {value}")]
    InvalidTimeout { field: &'static str, value: f64 },
    #[error("probe_text must not be empty")]
    EmptyProbeText,
    #[error("prompt_column must not be empty")]
    EmptyPromptColumn,
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("probe_timeout_secs", self.probe_timeout_secs),
            ("cell_timeout_secs", self.cell_timeout_secs),
            ("sandbox.script_timeout_secs", self.sandbox.script_timeout_secs),
        ] {
            if !(value > 0.0 && Duration::try_from_secs_f64(value).is_ok()) {
                return Err(ConfigError::InvalidTimeout { field, value });
            }
        }
        if self.probe_text.is_empty() {
            return Err(ConfigError::EmptyProbeText);
        }
        if self.prompt_column.trim().is_empty() {
            return Err(ConfigError::EmptyPromptColumn);
        }
        Ok(())
    }

    pub fn probe_deadline(&self) -> Duration {
        Duration::from_secs_f64(self.probe_timeout_secs)
    }

    pub fn cell_deadline(&self) -> Duration {
        Duration::from_secs_f64(self.cell_timeout_secs)
    }

    #[must_use]
    pub fn with_probe_timeout(mut self, secs: f64) -> Self {
        self.probe_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn with_cell_timeout(mut self, secs: f64) -> Self {
        self.cell_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn with_probe_text(mut self, text: impl Into<String>) -> Self {
        self.probe_text = text.into();
        self
    }

    #[must_use]
    pub fn with_builtins(mut self, include: bool) -> Self {
        self.include_builtins = include;
        self
    }

    #[must_use]
    pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_prompt_column(mut self, column: impl Into<String>) -> Self {
        self.prompt_column = column.into();
        self
    }

    #[must_use]
    pub fn with_sandbox(mut self, sandbox: SandboxSettings) -> Self {
        self.sandbox = sandbox;
        self
    }
}
