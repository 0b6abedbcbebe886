//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle phases and service calls produce:
//!     → logging.rs (structured log events to stdout and/or a rotating file,
//!                   one span per run with run_id)
//!     → metrics.rs (phase durations, failure counters)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics go through the `metrics` facade; no exporter is installed here

pub mod logging;
pub mod metrics;
