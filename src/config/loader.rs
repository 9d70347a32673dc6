//! Settings loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::Settings;
use crate::config::validation::{validate_settings, ValidationError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// An environment variable consulted while loading settings.
///
/// Loading runs before the log subscriber exists, so overrides are
/// collected and reported afterwards with [`EnvOverride::log`].
#[derive(Debug, Clone, PartialEq)]
pub enum EnvOverride {
    Applied { var: &'static str, value: String },
    Ignored { var: &'static str, value: String, reason: String },
}

impl EnvOverride {
    pub fn log(&self) {
        match self {
            Self::Applied { var, value } => {
                tracing::info!(var = %var, value = %value, "Applied environment override");
            }
            Self::Ignored { var, value, reason } => {
                tracing::warn!(
                    var = %var,
                    value = %value,
                    error = %reason,
                    "Ignoring invalid environment override"
                );
            }
        }
    }
}

/// Load settings: file (if given) over defaults, then environment overrides,
/// then validation. Returns the overrides seen along the way.
pub fn load_settings(path: Option<&Path>) -> Result<(Settings, Vec<EnvOverride>), SettingsError> {
    let mut settings = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => Settings::default(),
    };

    let overrides = apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    validate_settings(&settings).map_err(SettingsError::Validation)?;

    Ok((settings, overrides))
}

/// Apply the environment variables the controller has always honored.
///
/// Unparsable numeric values are ignored and reported as such.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Vec<EnvOverride>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overrides = Vec::new();

    if let Some(namespace) = lookup("POD_NAMESPACE").filter(|ns| !ns.is_empty()) {
        settings.discovery.namespace = namespace.clone();
        overrides.push(EnvOverride::Applied {
            var: "POD_NAMESPACE",
            value: namespace,
        });
    }

    if let Some(raw) = lookup("RATE_LIMIT_QPS") {
        overrides.push(match raw.parse::<f64>() {
            Ok(qps) => {
                settings.cluster.client_qps = qps;
                EnvOverride::Applied {
                    var: "RATE_LIMIT_QPS",
                    value: raw,
                }
            }
            Err(e) => EnvOverride::Ignored {
                var: "RATE_LIMIT_QPS",
                value: raw,
                reason: e.to_string(),
            },
        });
    }

    if let Some(raw) = lookup("RATE_LIMIT_BURST") {
        overrides.push(match raw.parse::<u32>() {
            Ok(burst) => {
                settings.cluster.client_burst = burst;
                EnvOverride::Applied {
                    var: "RATE_LIMIT_BURST",
                    value: raw,
                }
            }
            Err(e) => EnvOverride::Ignored {
                var: "RATE_LIMIT_BURST",
                value: raw,
                reason: e.to_string(),
            },
        });
    }

    overrides
}
