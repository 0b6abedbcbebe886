//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the application.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Startup and shutdown bounds.
    pub lifecycle: LifecycleConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Health endpoint listener.
    pub http: HttpConfig,
}

/// Lifecycle timeouts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Bound on the whole startup phase in seconds.
    pub start_timeout_secs: u64,

    /// Bound on the whole shutdown phase in seconds.
    pub shutdown_timeout_secs: u64,
}

impl LifecycleConfig {
    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: 15,
            shutdown_timeout_secs: 15,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub level: String,

    /// Output format: "text" or "json".
    pub format: String,

    /// Log file (e.g., "./logs/app.log"). No file output when unset.
    pub path: Option<PathBuf>,

    /// File rotation: "minutely", "hourly", "daily" or "never".
    pub rotation: String,

    /// Rotated files to keep; 0 keeps all of them.
    pub max_files: usize,

    /// Also write to stdout.
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            path: None,
            rotation: "daily".to_string(),
            max_files: 32,
            stdout: true,
        }
    }
}

/// HTTP health listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Register the HTTP service at all.
    pub enabled: bool,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}
