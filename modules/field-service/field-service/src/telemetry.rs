//! Logging setup.

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// `RUST_LOG` when set, otherwise the configured directive.
///
/// # Errors
/// Returns an error if the configured directive does not parse.
pub fn env_filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid log directive '{}'", config.level))
}

/// Install the global subscriber: human-readable or JSON lines on stdout.
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(config)?);
    if config.json {
        registry
            .with(fmt::layer().json())
            .try_init()
            .context("logging already initialised")?;
    } else {
        registry
            .with(fmt::layer())
            .try_init()
            .context("logging already initialised")?;
    }
    Ok(())
}
