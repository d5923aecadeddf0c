//! Process-wide `tracing` subscriber.

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines (for development).
    #[default]
    Text,
    /// One JSON object per line, with the span list (for production).
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".to_owned(),
        }
    }
}

/// Pick the filter: `RUST_LOG`, else the CLI verbosity, else the config.
fn build_filter(cfg: &LoggingConfig, verbose: u8) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = match verbose {
        0 => cfg.filter.as_str(),
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_new(directives)
        .map_err(|e| anyhow::anyhow!("invalid log filter '{directives}': {e}"))
}

/// Install the global subscriber.
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init(cfg: &LoggingConfig, verbose: u8) -> anyhow::Result<()> {
    let filter = build_filter(cfg, verbose)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match cfg.format {
        LogFormat::Text => builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize text logger: {e}"))?,
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize JSON logger: {e}"))?,
    }

    tracing::info!(format = ?cfg.format, "Logging initialized");
    Ok(())
}
