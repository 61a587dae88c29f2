//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Every problem is reported, not
//! just the first one.

use thiserror::Error;

use crate::config::schema::BallotConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("artifacts.dir must not be empty")]
    EmptyArtifactsDir,

    #[error("observability.log_level: unknown level '{0}'")]
    UnknownLogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &BallotConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let network = &config.network;

    check_url(&mut errors, "network.rpc_url", &network.rpc_url);
    for url in &network.failover_urls {
        check_url(&mut errors, "network.failover_urls", url);
    }
    check_url(&mut errors, "verification.api_url", &config.verification.api_url);

    let positive = [
        ("network.rpc_timeout_secs", network.rpc_timeout_secs),
        ("network.confirmation_blocks", network.confirmation_blocks),
        ("network.verify_confirmation_blocks", network.verify_confirmation_blocks),
        ("network.confirmation_timeout_secs", network.confirmation_timeout_secs),
        ("network.poll_interval_ms", network.poll_interval_ms),
        ("verification.poll_interval_secs", config.verification.poll_interval_secs),
        ("verification.max_polls", u64::from(config.verification.max_polls)),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.artifacts.dir.trim().is_empty() {
        errors.push(ValidationError::EmptyArtifactsDir);
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if url::Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
