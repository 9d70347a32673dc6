//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject pacing values the loop cannot honor
//! - Reject empty names and paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: Settings → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::Settings;

/// A single settings problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check settings for values the controller cannot run with.
pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let required = [
        ("discovery.namespace", &settings.discovery.namespace),
        ("discovery.annotation_prefix", &settings.discovery.annotation_prefix),
        ("discovery.router_deployment", &settings.discovery.router_deployment),
        ("proxy.ssl_dir", &settings.proxy.ssl_dir),
        ("proxy.config_file", &settings.proxy.config_file),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
    }

    if settings.proxy.reload_command.is_empty() {
        errors.push(ValidationError::new("proxy.reload_command", "must name a program"));
    }

    if !(settings.reconcile.ticks_per_second > 0.0) {
        errors.push(ValidationError::new(
            "reconcile.ticks_per_second",
            format!("must be positive, got {}", settings.reconcile.ticks_per_second),
        ));
    }
    if settings.reconcile.burst == 0 {
        errors.push(ValidationError::new("reconcile.burst", "must be at least 1"));
    }

    if !(settings.cluster.client_qps > 0.0) {
        errors.push(ValidationError::new(
            "cluster.client_qps",
            format!("must be positive, got {}", settings.cluster.client_qps),
        ));
    }
    if settings.cluster.client_burst == 0 {
        errors.push(ValidationError::new("cluster.client_burst", "must be at least 1"));
    }

    if settings.observability.metrics_enabled
        && settings
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: '{}'", settings.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut settings = Settings::default();
        settings.discovery.namespace = String::new();
        settings.reconcile.ticks_per_second = 0.0;
        settings.cluster.client_burst = 0;

        let errors = validate_settings(&settings).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["discovery.namespace", "reconcile.ticks_per_second", "cluster.client_burst"]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut settings = Settings::default();
        settings.observability.metrics_address = "nowhere".to_string();
        assert!(validate_settings(&settings).is_ok());

        settings.observability.metrics_enabled = true;
        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}
