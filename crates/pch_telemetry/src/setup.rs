use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to initialize telemetry: {0}")]
    Init(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct TelemetryConfig {
    /// When set, JSON log lines are also appended to `<log_dir>/pch.log`.
    pub log_dir: Option<PathBuf>,
    pub level: tracing::Level,
    /// Console output as JSON instead of human-readable lines.
    pub json_output: bool,
    pub human_output: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            level: tracing::Level::INFO,
            json_output: false,
            human_output: true,
        }
    }
}

impl TelemetryConfig {
    /// DEBUG when verbose, INFO otherwise.
    pub fn for_verbosity(verbose: bool) -> Self {
        Self {
            level: if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO },
            ..Default::default()
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
/// Console output goes to stderr so tables printed on stdout stay clean.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let console = config.human_output.then(|| {
        let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
        if config.json_output { layer.json().boxed() } else { layer.boxed() }
    });

    let file = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let log = std::fs::OpenOptions::new().create(true).append(true).open(dir.join("pch.log"))?;
            Some(fmt::layer().json().with_ansi(false).with_writer(std::sync::Mutex::new(log)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    Ok(())
}
