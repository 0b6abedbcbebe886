//! Lifecycle failure taxonomy.
//!
//! Every failure seen during a run is kept as a [`Failure`] tagged with the
//! position and name of the service it came from. A phase folds its failures
//! into one [`JoinedError`] instead of letting a later failure overwrite an
//! earlier one.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use thiserror::Error;

use crate::lifecycle::context::ContextError;

/// Error type returned by service callbacks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The lifecycle operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position and name of a registered service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTag {
    /// Zero-based registration index.
    pub index: usize,
    pub name: String,
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service #{} ({})", self.index, self.name)
    }
}

/// A single cause collected during a run.
#[derive(Debug, Error)]
pub enum Failure {
    /// The service callback returned an error.
    #[error("{service} failed to {action}: {source}")]
    Service {
        service: ServiceTag,
        action: Action,
        #[source]
        source: BoxError,
    },

    /// The phase deadline elapsed (or the phase was cancelled) while the callback was running.
    #[error("{service} did not finish {action} in time: {source}")]
    Deadline {
        service: ServiceTag,
        action: Action,
        #[source]
        source: ContextError,
    },

    /// The callback task ended without reporting a result.
    #[error("{service} {action} task exited without returning")]
    SilentExit { service: ServiceTag, action: Action },

    /// The phase context ended between calls; this and later services were not called.
    #[error("{action} interrupted before {service}: {source}")]
    Interrupted {
        service: ServiceTag,
        action: Action,
        #[source]
        source: ContextError,
    },

    /// The termination trigger itself failed.
    #[error("termination trigger failed: {0}")]
    Trigger(#[source] io::Error),
}

impl Failure {
    /// The service this failure is attributed to, if any.
    pub fn service(&self) -> Option<&ServiceTag> {
        match self {
            Failure::Service { service, .. }
            | Failure::Deadline { service, .. }
            | Failure::SilentExit { service, .. }
            | Failure::Interrupted { service, .. } => Some(service),
            Failure::Trigger(_) => None,
        }
    }

    pub fn action(&self) -> Option<Action> {
        match self {
            Failure::Service { action, .. }
            | Failure::Deadline { action, .. }
            | Failure::SilentExit { action, .. }
            | Failure::Interrupted { action, .. } => Some(*action),
            Failure::Trigger(_) => None,
        }
    }
}

/// An ordered, non-empty list of failures reported as one error.
///
/// Formats as the causes joined by `"; "` in the order they happened.
#[derive(Debug)]
pub struct JoinedError {
    failures: Vec<Failure>,
}

impl JoinedError {
    pub fn new(first: Failure) -> Self {
        Self {
            failures: vec![first],
        }
    }

    /// Returns `None` when there is nothing to report.
    pub fn from_failures(failures: Vec<Failure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Failure> {
        self.failures.iter()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn extend(&mut self, more: impl IntoIterator<Item = Failure>) {
        self.failures.extend(more);
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }

    /// True if any cause, or anything in a cause's source chain, is an `E`.
    pub fn contains<E: StdError + 'static>(&self) -> bool {
        self.failures.iter().any(|failure| {
            let mut current: Option<&(dyn StdError + 'static)> = Some(failure);
            while let Some(err) = current {
                if err.is::<E>() {
                    return true;
                }
                current = err.source();
            }
            false
        })
    }

    /// True if any cause matches `predicate`.
    pub fn any<P: FnMut(&Failure) -> bool>(&self, predicate: P) -> bool {
        self.failures.iter().any(predicate)
    }
}

impl fmt::Display for JoinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl StdError for JoinedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.failures.first().map(|f| f as &(dyn StdError + 'static))
    }
}

impl<'a> IntoIterator for &'a JoinedError {
    type Item = &'a Failure;
    type IntoIter = std::slice::Iter<'a, Failure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

/// Outcome of [`Application::run`](crate::lifecycle::Application::run).
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Startup failed; includes the triggering failure and any rollback failures.
    #[error("failed to start application: {0}")]
    Start(#[source] JoinedError),

    /// Shutdown finished with failures.
    #[error("failed to shutdown application: {0}")]
    Shutdown(#[source] JoinedError),

    /// `run` was called on an application that already ran.
    #[error("application has already been run")]
    AlreadyRun,
}

impl LifecycleError {
    /// The collected causes, empty for `AlreadyRun`.
    pub fn failures(&self) -> &[Failure] {
        match self {
            LifecycleError::Start(joined) | LifecycleError::Shutdown(joined) => joined.failures(),
            LifecycleError::AlreadyRun => &[],
        }
    }
}
