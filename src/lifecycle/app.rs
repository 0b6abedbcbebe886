//! The application lifecycle orchestrator.
//!
//! # Data Flow
//! ```text
//! run(ctx)
//!     → startup:  ctx.with_timeout(start_timeout), start in order, roll back on failure
//!     → wait:     termination trigger or root cancellation, unbounded
//!     → shutdown: ctx.with_timeout(shutdown_timeout), stop in reverse order
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;
use uuid::Uuid;

use crate::config::LifecycleConfig;
use crate::lifecycle::bounded::{run_bounded, TaskError};
use crate::lifecycle::context::Context;
use crate::lifecycle::error::{Action, Failure, JoinedError, LifecycleError, ServiceTag};
use crate::lifecycle::service::Service;
use crate::lifecycle::shutdown::stop_services;
use crate::lifecycle::signals::{OsSignals, Termination, TerminationTrigger};
use crate::lifecycle::startup::start_services;
use crate::observability::metrics::{self, Phase};

pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

/// A registered service and its position.
pub(crate) struct Entry {
    pub(crate) tag: ServiceTag,
    pub(crate) service: Arc<dyn Service>,
}

/// Owns an ordered set of services and drives them through start, wait and stop.
///
/// Registration order is dependency order: services start first-to-last and
/// stop last-to-first. `run` may be called once.
pub struct Application {
    services: Vec<Entry>,
    start_timeout: Duration,
    shutdown_timeout: Duration,
    trigger: Box<dyn TerminationTrigger>,
    ran: bool,
}

impl Application {
    /// Default timeouts, OS signals as the termination trigger.
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            start_timeout: DEFAULT_START_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            trigger: Box::new(OsSignals),
            ran: false,
        }
    }

    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self::new()
            .with_start_timeout(config.start_timeout())
            .with_shutdown_timeout(config.shutdown_timeout())
    }

    /// Bound on the whole startup phase, rollback included.
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Bound on the whole shutdown phase.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_trigger(mut self, trigger: impl TerminationTrigger + 'static) -> Self {
        self.trigger = Box::new(trigger);
        self
    }

    /// Append a service. Must happen before `run`.
    pub fn register(&mut self, service: impl Service + 'static) -> &mut Self {
        let service: Arc<dyn Service> = Arc::new(service);
        let tag = ServiceTag {
            index: self.services.len(),
            name: service.name().to_string(),
        };
        tracing::debug!(service = %tag.name, index = tag.index, "Service registered");
        self.services.push(Entry { tag, service });
        self
    }

    pub fn start_timeout(&self) -> Duration {
        self.start_timeout
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Start every service, block until termination is requested, then stop them.
    ///
    /// Returns `Err(Start)` if startup failed (nothing keeps running), or
    /// `Err(Shutdown)` if any stop failed. Both phases run under children of
    /// `ctx`: its deadline caps each phase, and once it is cancelled the
    /// shutdown phase reports the interruption instead of calling `stop`.
    /// A second call returns `AlreadyRun`.
    pub async fn run(&mut self, ctx: &Context) -> Result<(), LifecycleError> {
        if self.ran {
            return Err(LifecycleError::AlreadyRun);
        }
        self.ran = true;

        let span = tracing::info_span!("lifecycle", run_id = %Uuid::new_v4());
        self.run_phases(ctx).instrument(span).await
    }

    async fn run_phases(&self, ctx: &Context) -> Result<(), LifecycleError> {
        tracing::info!(
            services = self.services.len(),
            start_timeout = ?self.start_timeout,
            "Starting application"
        );

        let started = Instant::now();
        let (start_ctx, start_guard) = ctx.with_timeout(self.start_timeout);
        tracing::debug!(budget = ?remaining(&start_ctx), "Startup phase scope opened");
        let startup = start_services(&start_ctx, &self.services).await;
        drop(start_guard);
        metrics::record_phase(Phase::Startup, started);

        if let Err(joined) = startup {
            tracing::error!(error = %joined, "Application failed to start");
            return Err(LifecycleError::Start(joined));
        }
        tracing::info!(elapsed = ?started.elapsed(), "Application started successfully");

        let mut failures = Vec::new();
        match self.wait_for_termination(ctx).await {
            Ok(reason) => tracing::info!(reason = %reason, "Shutting down application"),
            Err(e) => {
                tracing::error!(error = %e, "Termination trigger failed, shutting down");
                failures.push(Failure::Trigger(e));
            }
        }

        let started = Instant::now();
        let (stop_ctx, stop_guard) = ctx.with_timeout(self.shutdown_timeout);
        tracing::debug!(budget = ?remaining(&stop_ctx), "Shutdown phase scope opened");
        stop_services(&stop_ctx, &self.services, &mut failures).await;
        drop(stop_guard);
        metrics::record_phase(Phase::Shutdown, started);

        match JoinedError::from_failures(failures) {
            Some(joined) => {
                tracing::error!(error = %joined, "Application shutdown finished with errors");
                Err(LifecycleError::Shutdown(joined))
            }
            None => {
                tracing::info!(elapsed = ?started.elapsed(), "Application shutdown complete");
                Ok(())
            }
        }
    }

    async fn wait_for_termination(&self, ctx: &Context) -> std::io::Result<Termination> {
        tokio::select! {
            fired = self.trigger.wait() => fired,
            _ = ctx.done() => Ok(Termination::Cancelled),
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("services", &self.services.iter().map(|e| &e.tag).collect::<Vec<_>>())
            .field("start_timeout", &self.start_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("ran", &self.ran)
            .finish()
    }
}

/// Time left before `ctx` reaches its deadline; shorter than the phase
/// timeout when the root deadline is closer.
fn remaining(ctx: &Context) -> Option<Duration> {
    ctx.deadline()
        .map(|deadline| deadline.saturating_duration_since(tokio::time::Instant::now()))
}

/// Run one start or stop call as a bounded task and classify the outcome.
pub(crate) async fn invoke(ctx: &Context, entry: &Entry, action: Action) -> Result<(), Failure> {
    let service = Arc::clone(&entry.service);
    let started = Instant::now();
    tracing::debug!(service = %entry.tag.name, index = entry.tag.index, %action, "Calling service");

    let outcome = run_bounded(ctx, move |ctx| async move {
        match action {
            Action::Start => service.start(ctx).await,
            Action::Stop => service.stop(ctx).await,
        }
    })
    .await;

    let tag = || entry.tag.clone();
    let result = match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(Failure::Service {
            service: tag(),
            action,
            source,
        }),
        Err(TaskError::Context(source)) => Err(Failure::Deadline {
            service: tag(),
            action,
            source,
        }),
        Err(TaskError::SilentExit) => Err(Failure::SilentExit {
            service: tag(),
            action,
        }),
    };

    match &result {
        Ok(()) => tracing::info!(
            service = %entry.tag.name,
            index = entry.tag.index,
            %action,
            elapsed = ?started.elapsed(),
            "Service {} complete",
            action
        ),
        Err(failure) => {
            tracing::warn!(
                service = %entry.tag.name,
                index = entry.tag.index,
                %action,
                error = %failure,
                "Service {} failed",
                action
            );
            metrics::record_service_failure(&entry.tag.name, action);
        }
    }
    result
}
