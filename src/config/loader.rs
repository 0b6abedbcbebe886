//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = %path.display(), "Using config file");
    Ok(config)
}

/// Parse and validate configuration text, expanding `${VAR}` references first.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let expanded = expand_env(content, |name| std::env::var(name).ok());
    let config: AppConfig = toml::from_str(&expanded)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Replace `${NAME}` with `lookup(NAME)`. Unset or empty values leave the
/// reference untouched, as does an unterminated `${`.
fn expand_env<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match lookup(name).filter(|v| !v.is_empty()) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[start..start + 2 + end + 1]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "PORT" => Some("9000".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn test_expand_env() {
        assert_eq!(expand_env("addr = \":${PORT}\"", lookup), "addr = \":9000\"");
        assert_eq!(expand_env("${MISSING}-${PORT}", lookup), "${MISSING}-9000");
        assert_eq!(expand_env("${EMPTY}", lookup), "${EMPTY}");
        assert_eq!(expand_env("tail ${PORT", lookup), "tail ${PORT");
        assert_eq!(expand_env("no refs", lookup), "no refs");
    }

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.lifecycle.start_timeout_secs, 15);
        assert_eq!(config.lifecycle.shutdown_timeout_secs, 15);
        assert_eq!(config.logging.format, "text");
        assert!(config.http.enabled);
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [lifecycle]
            start_timeout_secs = 5
            shutdown_timeout_secs = 30

            [logging]
            level = "debug"
            format = "json"
            path = "logs/app.log"
            rotation = "hourly"
            max_files = 4
            stdout = false

            [http]
            enabled = false
            bind_address = "127.0.0.1:3000"
            "#,
        )
        .unwrap();

        assert_eq!(config.lifecycle.start_timeout_secs, 5);
        assert_eq!(config.lifecycle.shutdown_timeout_secs, 30);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.path.as_deref(), Some(Path::new("logs/app.log")));
        assert_eq!(config.logging.rotation, "hourly");
        assert_eq!(config.logging.max_files, 4);
        assert!(!config.logging.stdout);
        assert!(!config.http.enabled);
        assert_eq!(config.http.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let err = parse_config("[lifecycle]\nstart_timeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
    }

    #[test]
    fn test_validation_error_lists_every_problem() {
        let err = parse_config(
            "[lifecycle]\nstart_timeout_secs = 0\n[logging]\nformat = \"xml\"\n",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: lifecycle.start_timeout_secs must be greater than zero, \
             unknown log format 'xml' (expected text or json)"
        );
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[lifecycle\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Parse error: "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/app-lifecycle.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
