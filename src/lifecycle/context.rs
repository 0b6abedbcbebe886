//! Execution context carrying cancellation and a deadline.
//!
//! # Responsibilities
//! - Give every start/stop call one value that says "stop working now"
//! - Derive child contexts with a cancel guard or a shorter deadline
//! - Propagate cancellation from parent to children, never upward
//!
//! # Design Decisions
//! - Cancellation state lives in a `watch` channel so late subscribers still see it
//! - Children are held weakly by the parent; dropped children cost nothing
//! - Deadlines are folded at derivation time (child deadline = min(parent, own))

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant};

/// Why a context ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context (or one of its ancestors) was cancelled.
    #[error("context cancelled")]
    Cancelled,

    /// The context deadline elapsed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

struct Inner {
    state: watch::Sender<Option<ContextError>>,
    deadline: Option<Instant>,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new(deadline: Option<Instant>) -> Arc<Self> {
        let (state, _) = watch::channel(None);
        Arc::new(Self {
            state,
            deadline,
            children: Mutex::new(Vec::new()),
        })
    }

    fn end(&self, reason: ContextError) {
        // An elapsed deadline wins over a later cancel.
        let reason = match self.deadline {
            Some(deadline) if Instant::now() >= deadline => ContextError::DeadlineExceeded,
            _ => reason,
        };
        let changed = self.state.send_if_modified(|state| {
            if state.is_none() {
                *state = Some(reason);
                true
            } else {
                false
            }
        });
        if !changed {
            return;
        }

        let children = std::mem::take(
            &mut *self.children.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for child in children.iter().filter_map(Weak::upgrade) {
            child.end(reason);
        }
    }

    fn reason(&self) -> Option<ContextError> {
        let current = *self.state.borrow();
        if current.is_some() {
            return current;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }
}

/// A cancellable, optionally deadline-bounded execution scope.
///
/// Cloning is cheap; clones observe the same cancellation.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Root context: never cancelled, no deadline.
    pub fn background() -> Self {
        Self {
            inner: Inner::new(None),
        }
    }

    /// Derive a child that ends when the returned guard is cancelled or dropped.
    pub fn with_cancel(&self) -> (Context, CancelGuard) {
        self.derive(self.inner.deadline)
    }

    /// Derive a child bounded by `timeout` from now (or the parent deadline, if sooner).
    pub fn with_timeout(&self, timeout: Duration) -> (Context, CancelGuard) {
        let own = Instant::now() + timeout;
        let deadline = match self.inner.deadline {
            Some(parent) => parent.min(own),
            None => own,
        };
        self.derive(Some(deadline))
    }

    /// The instant after which this context reports `DeadlineExceeded`.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Non-blocking check; `None` while the context is live.
    pub fn err(&self) -> Option<ContextError> {
        self.inner.reason()
    }

    /// Wait until the context ends and report why.
    pub async fn done(&self) -> ContextError {
        let mut state = self.inner.state.subscribe();
        let cancelled = async {
            loop {
                let current = *state.borrow_and_update();
                if let Some(reason) = current {
                    return reason;
                }
                if state.changed().await.is_err() {
                    // Sender lives as long as `self`; unreachable in practice.
                    std::future::pending::<()>().await;
                }
            }
        };
        let expired = async {
            match self.inner.deadline {
                Some(deadline) => {
                    time::sleep_until(deadline).await;
                    ContextError::DeadlineExceeded
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            reason = cancelled => reason,
            reason = expired => reason,
        }
    }

    fn derive(&self, deadline: Option<Instant>) -> (Context, CancelGuard) {
        let child = Inner::new(deadline);
        {
            let mut children = self
                .inner
                .children
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let current = *self.inner.state.borrow();
            match current {
                Some(reason) => child.end(reason),
                None => {
                    children.retain(|c| c.strong_count() > 0);
                    children.push(Arc::downgrade(&child));
                }
            }
        }

        let guard = CancelGuard {
            inner: Arc::clone(&child),
        };
        (Context { inner: child }, guard)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish()
    }
}

/// Cancels its context when `cancel` is called or the guard is dropped.
#[must_use = "dropping the guard cancels the context immediately"]
pub struct CancelGuard {
    inner: Arc<Inner>,
}

impl CancelGuard {
    pub fn cancel(self) {
        // Drop does the work.
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.inner.end(ContextError::Cancelled);
    }
}
