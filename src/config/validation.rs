//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject unknown log levels, formats and rotations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "warning", "error"];
const FORMATS: &[&str] = &["text", "json"];
const ROTATIONS: &[&str] = &["minutely", "hourly", "daily", "never"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("unknown log level '{0}'")]
    UnknownLevel(String),

    #[error("unknown log format '{0}' (expected text or json)")]
    UnknownFormat(String),

    #[error("unknown log rotation '{0}' (expected minutely, hourly, daily or never)")]
    UnknownRotation(String),

    #[error("logging has no output (stdout is off and no path is set)")]
    NoLogOutput,

    #[error("invalid bind address '{0}'")]
    BindAddress(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.lifecycle.start_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "lifecycle.start_timeout_secs",
        });
    }
    if config.lifecycle.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "lifecycle.shutdown_timeout_secs",
        });
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLevel(config.logging.level.clone()));
    }

    let format = config.logging.format.to_ascii_lowercase();
    if !FORMATS.contains(&format.as_str()) {
        errors.push(ValidationError::UnknownFormat(config.logging.format.clone()));
    }

    let rotation = config.logging.rotation.to_ascii_lowercase();
    if !ROTATIONS.contains(&rotation.as_str()) {
        errors.push(ValidationError::UnknownRotation(config.logging.rotation.clone()));
    }

    if !config.logging.stdout && config.logging.path.is_none() {
        errors.push(ValidationError::NoLogOutput);
    }

    if config.http.enabled && config.http.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.http.bind_address.clone()));
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
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.lifecycle.start_timeout_secs = 0;
        config.lifecycle.shutdown_timeout_secs = 0;
        config.logging.level = "loud".into();
        config.logging.format = "xml".into();
        config.http.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::UnknownLevel("loud".into())));
    }

    #[test]
    fn test_log_output_settings() {
        let mut config = AppConfig::default();
        config.logging.rotation = "weekly".into();
        config.logging.stdout = false;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::UnknownRotation("weekly".into()),
                ValidationError::NoLogOutput,
            ]
        );

        config.logging.rotation = "Hourly".into();
        config.logging.path = Some("logs/app.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bind_address_ignored_when_http_disabled() {
        let mut config = AppConfig::default();
        config.http.enabled = false;
        config.http.bind_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());
    }
}
