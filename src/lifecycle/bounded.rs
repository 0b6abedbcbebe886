//! Deadline-bounded execution of externally supplied async work.
//!
//! # Responsibilities
//! - Run one callback on its own task under a child context
//! - Race its single result against the bounding context
//! - Turn a task that dies without reporting into an explicit error
//!
//! # Design Decisions
//! - Cooperative only: a timed-out task is never aborted, it is told to stop
//!   through its context and its late result is discarded
//! - `wait` consumes the handle, so a task cannot be awaited twice

use std::future::Future;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::lifecycle::context::{CancelGuard, Context, ContextError};

/// Why a bounded task produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The bounding context ended before the task reported.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The task finished (or unwound) without sending a result.
    #[error("task exited without returning a result")]
    SilentExit,
}

/// Handle to one spawned unit of work raced against a context.
pub struct BoundedTask<T> {
    bound: Context,
    result: oneshot::Receiver<T>,
    // Cancels the task's context once the handle is consumed or dropped.
    _task_ctx: CancelGuard,
}

impl<T: Send + 'static> BoundedTask<T> {
    /// Spawn `f` on a new task. `f` receives a child of `ctx` that is cancelled
    /// as soon as the caller stops waiting.
    pub fn spawn<F, Fut>(ctx: &Context, f: F) -> Self
    where
        F: FnOnce(Context) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (task_ctx, guard) = ctx.with_cancel();
        let (tx, rx) = oneshot::channel();
        let work = f(task_ctx);

        tokio::spawn(async move {
            let value = work.await;
            // Err means the caller gave up waiting; the value is discarded.
            let _ = tx.send(value);
        });

        Self {
            bound: ctx.clone(),
            result: rx,
            _task_ctx: guard,
        }
    }

    /// Wait for the task's result or the end of the bounding context, whichever comes first.
    pub async fn wait(self) -> Result<T, TaskError> {
        let Self {
            bound,
            result,
            _task_ctx,
        } = self;

        tokio::select! {
            biased;
            received = result => received.map_err(|_| TaskError::SilentExit),
            reason = bound.done() => Err(TaskError::Context(reason)),
        }
    }
}

/// Spawn `f` and wait for it under `ctx`.
pub async fn run_bounded<T, F, Fut>(ctx: &Context, f: F) -> Result<T, TaskError>
where
    T: Send + 'static,
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    BoundedTask::spawn(ctx, f).wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_returns_callback_result() {
        let ctx = Context::background();
        let value = run_bounded(&ctx, |_| async { 7 }).await;
        assert_eq!(value, Ok(7));
    }

    #[tokio::test]
    async fn test_hung_callback_hits_deadline() {
        let (ctx, _guard) = Context::background().with_timeout(Duration::from_millis(50));
        let started = Instant::now();

        let result = run_bounded(&ctx, |_| std::future::pending::<()>()).await;

        assert_eq!(result, Err(TaskError::Context(ContextError::DeadlineExceeded)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_panicking_callback_is_silent_exit() {
        let ctx = Context::background();
        let result: Result<(), TaskError> =
            run_bounded(&ctx, |_| async { panic!("callback crashed") }).await;
        assert_eq!(result, Err(TaskError::SilentExit));
    }

    #[tokio::test]
    async fn test_parent_cancel_reported() {
        let (ctx, guard) = Context::background().with_cancel();
        let task = BoundedTask::spawn(&ctx, |_| std::future::pending::<()>());
        guard.cancel();
        assert_eq!(
            task.wait().await,
            Err(TaskError::Context(ContextError::Cancelled))
        );
    }

    #[tokio::test]
    async fn test_task_context_cancelled_after_wait() {
        let ctx = Context::background();
        let (seen_tx, seen_rx) = oneshot::channel();

        let result = run_bounded(&ctx, move |task_ctx| async move {
            let _ = seen_tx.send(task_ctx);
        })
        .await;

        assert_eq!(result, Ok(()));
        let task_ctx = seen_rx.await.unwrap();
        assert_eq!(task_ctx.err(), Some(ContextError::Cancelled));
        assert_eq!(ctx.err(), None);
    }

    #[tokio::test]
    async fn test_timed_out_task_observes_its_context() {
        let (ctx, _guard) = Context::background().with_timeout(Duration::from_millis(30));
        let (seen_tx, seen_rx) = oneshot::channel();

        let _ = run_bounded(&ctx, move |task_ctx| async move {
            let reason = task_ctx.done().await;
            let _ = seen_tx.send(reason);
        })
        .await;

        assert_eq!(seen_rx.await.unwrap(), ContextError::DeadlineExceeded);
    }
}
