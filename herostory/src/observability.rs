//! Log subscriber installation.

use crate::config::LoggingConfig;
use crate::errors::ConfigError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Builds the filter. `RUST_LOG` wins over the configured level.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(config.level.trim())
        .map_err(|e| ConfigError::Invalid(format!("logging.level '{}': {e}", config.level)))
}

/// Installs the global subscriber writing to stderr in text or JSON.
///
/// Fails if the level does not parse, the format is unknown, or a
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = build_env_filter(config)?;
    let registry = Registry::default().with(filter);

    let installed = match config.format.trim() {
        "json" => registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        "text" | "" => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        other => {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be 'text' or 'json', got '{other}'"
            )))
        }
    };
    installed.map_err(|e| ConfigError::Invalid(format!("tracing already initialized: {e}")))
}
