use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};

/// `RUST_LOG` takes precedence over `logging.level` when set.
pub fn init_tracing(config: &ServerConfig) -> Result<(), ConfigError> {
    let from_env = std::env::var("RUST_LOG").ok();
    let raw = from_env
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .or(config.logging.level.as_deref());
    let filter = build_filter(raw)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .map_err(|e| ConfigError::Invalid(format!("tracing init failed: {e}")))?;
    Ok(())
}

fn build_filter(raw: Option<&str>) -> Result<EnvFilter, ConfigError> {
    let level = raw.map(str::trim).filter(|v| !v.is_empty()).unwrap_or("info");
    EnvFilter::try_new(level)
        .map_err(|e| ConfigError::Invalid(format!("invalid logging.level: {e}")))
}
