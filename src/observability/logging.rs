//! Structured logging.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber
//! - Pick text or JSON output from settings
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - JSON for production log shipping, text for local runs

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilitySettings};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("failed to install log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Build the level filter: `RUST_LOG` if set, the configured directive otherwise.
pub fn env_filter(settings: &ObservabilitySettings) -> Result<EnvFilter, ParseError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.log_level),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(settings: &ObservabilitySettings) -> Result<(), LoggingError> {
    let filter = env_filter(settings)?;
    let json = settings.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_directive_is_rejected() {
        let settings = ObservabilitySettings {
            log_level: "edge_router=verbose".to_string(),
            ..ObservabilitySettings::default()
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(env_filter(&settings).is_err());
        }
    }

    #[test]
    fn test_default_directive_parses() {
        assert!(env_filter(&ObservabilitySettings::default()).is_ok());
    }
}
