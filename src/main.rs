//! Application lifecycle host.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI (--config) → config loader → logging
//!                                       │
//!                                       ▼
//!                        ┌──────────────────────────────┐
//!                        │         Application          │
//!                        │  startup → wait → shutdown   │
//!                        │      │               │       │
//!                        │      ▼               ▼       │
//!                        │   services in    services in │
//!                        │   order          reverse     │
//!                        └──────────────────────────────┘
//!                                       │
//!                                       ▼
//!                                 exit status
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use app_lifecycle::buildinfo;
use app_lifecycle::config::{load_config, AppConfig};
use app_lifecycle::lifecycle::{Application, Context};
use app_lifecycle::observability::logging::init_logging;
use app_lifecycle::services::HttpService;

#[derive(Parser)]
#[command(name = "app-lifecycle")]
#[command(version = buildinfo::short())]
#[command(about = "Run services under a bounded start/stop lifecycle", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };

    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(build = %buildinfo::full(), "Starting {}", buildinfo::NAME);
    tracing::info!(
        start_timeout_secs = config.lifecycle.start_timeout_secs,
        shutdown_timeout_secs = config.lifecycle.shutdown_timeout_secs,
        "Configuration loaded"
    );

    let mut app = Application::from_config(&config.lifecycle);
    if config.http.enabled {
        app.register(HttpService::from_config(&config.http));
    }

    match app.run(&Context::background()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Application exited with errors");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_version_flag_reports_build_info() {
        let err = Cli::try_parse_from(["app-lifecycle", "--version"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert!(err.to_string().contains(buildinfo::short()));
    }

    #[test]
    fn test_config_flag() {
        let cli = Cli::try_parse_from(["app-lifecycle", "-c", "app.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("app.toml")));
    }
}
