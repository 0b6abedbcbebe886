//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     start services in registration order → roll back newest-first on failure
//!
//! Wait (signals.rs):
//!     SIGINT/SIGTERM/SIGHUP, manual trigger or root cancellation → shutdown
//!
//! Shutdown (shutdown.rs):
//!     stop services in reverse order → collect every failure
//! ```
//!
//! # Design Decisions
//! - Ordering is caller-supplied and respected literally (no dependency graph)
//! - Every start/stop call runs as a bounded task (bounded.rs) so a hung
//!   callback cannot hang the process
//! - Timeouts bound whole phases, not individual services
//! - Failures are data: nothing is dropped, everything is joined (error.rs)

pub mod app;
pub mod bounded;
pub mod context;
pub mod error;
pub mod service;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use app::Application;
pub use bounded::{run_bounded, BoundedTask, TaskError};
pub use context::{CancelGuard, Context, ContextError};
pub use error::{Action, BoxError, Failure, JoinedError, LifecycleError, ServiceTag};
pub use service::{Service, ServiceFn};
pub use signals::{ManualTrigger, OsSignals, Termination, TerminationTrigger};
