//! Lifecycle metrics.
//!
//! # Metrics
//! - `lifecycle_phase_duration_seconds` (histogram): wall-clock per phase
//! - `lifecycle_service_failures_total` (counter): failures by service and action
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding binary installs a recorder.

use std::time::Instant;

use metrics::{counter, histogram};

use crate::lifecycle::Action;

/// Phase label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Startup,
    Shutdown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Startup => "startup",
            Phase::Shutdown => "shutdown",
        }
    }
}

pub fn record_phase(phase: Phase, started: Instant) {
    histogram!("lifecycle_phase_duration_seconds", "phase" => phase.as_str())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_service_failure(service: &str, action: Action) {
    counter!(
        "lifecycle_service_failures_total",
        "service" => service.to_string(),
        "action" => action.as_str()
    )
    .increment(1);
}
