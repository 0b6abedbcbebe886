//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick text or JSON output from config
//! - Write to stdout, a rotating log file, or both
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` overrides the configured level when set
//! - File output goes through a non-blocking writer; the returned guard
//!   flushes it and must live until the process exits

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file in {dir}: {source}")]
    File {
        dir: PathBuf,
        #[source]
        source: InitError,
    },

    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Keeps the background file writer alive. Dropping it flushes pending lines.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.level)));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.stdout {
        layers.push(fmt_layer(&config.format, std::io::stdout, true));
    }

    let mut guard = LogGuard::default();
    if let Some(path) = &config.path {
        let appender = file_appender(path, &config.rotation, config.max_files)?;
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt_layer(&config.format, writer, false));
        guard._file = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    tracing::info!(
        level = %config.level,
        format = %config.format,
        path = ?config.path,
        rotation = %config.rotation,
        stdout = config.stdout,
        "Logger initialized"
    );
    Ok(guard)
}

fn fmt_layer<W>(format: &str, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);
    if format.eq_ignore_ascii_case("json") {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

/// Rolling appender for `path`: `logs/app.log` rotates into
/// `logs/app.<date>.log`, keeping at most `max_files` (0 keeps all).
fn file_appender(
    path: &Path,
    rotation: &str,
    max_files: usize,
) -> Result<RollingFileAppender, LoggingError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());

    let mut builder = RollingFileAppender::builder()
        .rotation(parse_rotation(rotation))
        .filename_prefix(prefix);
    if let Some(ext) = path.extension() {
        builder = builder.filename_suffix(ext.to_string_lossy().into_owned());
    }
    if max_files > 0 {
        builder = builder.max_log_files(max_files);
    }

    builder
        .build(&dir)
        .map_err(|source| LoggingError::File { dir, source })
}

/// Unknown values fall back to daily; validation rejects them earlier.
fn parse_rotation(rotation: &str) -> Rotation {
    match rotation.to_ascii_lowercase().as_str() {
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn default_directive(level: &str) -> String {
    match level.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        other => other.to_string(),
    }
}
