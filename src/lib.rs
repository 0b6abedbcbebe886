//! Application lifecycle orchestration.
//!
//! Starts independently owned services in registration order under a startup
//! deadline, waits for a termination signal or cancellation, then stops them
//! in reverse order under a shutdown deadline, reporting every failure.

pub mod buildinfo;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod services;

pub use config::AppConfig;
pub use lifecycle::{Application, Context, LifecycleError, Service, ServiceFn};
