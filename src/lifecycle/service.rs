//! The service contract consumed by the orchestrator.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::lifecycle::context::Context;
use crate::lifecycle::error::BoxError;

/// A long-lived component with an explicit start/stop lifecycle.
///
/// Both operations receive a context bounded by the phase timeout. A
/// callback that ignores its context cannot be interrupted; the orchestrator
/// only stops waiting for it.
#[async_trait]
pub trait Service: Send + Sync {
    /// Name used in logs, metrics and failure messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn start(&self, ctx: Context) -> Result<(), BoxError>;

    async fn stop(&self, ctx: Context) -> Result<(), BoxError>;
}

#[async_trait]
impl<S: Service + ?Sized> Service for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn start(&self, ctx: Context) -> Result<(), BoxError> {
        (**self).start(ctx).await
    }

    async fn stop(&self, ctx: Context) -> Result<(), BoxError> {
        (**self).stop(ctx).await
    }
}

type HookFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;
type Hook = Box<dyn Fn(Context) -> HookFuture + Send + Sync>;

/// Adapter that turns two independent closures into a [`Service`].
///
/// A missing hook is a successful no-op.
pub struct ServiceFn {
    name: String,
    on_start: Option<Hook>,
    on_stop: Option<Hook>,
}

impl ServiceFn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_start: None,
            on_stop: None,
        }
    }

    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.on_start = Some(Box::new(move |ctx| Box::pin(f(ctx))));
        self
    }

    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.on_stop = Some(Box::new(move |ctx| Box::pin(f(ctx))));
        self
    }
}

#[async_trait]
impl Service for ServiceFn {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: Context) -> Result<(), BoxError> {
        match &self.on_start {
            Some(hook) => hook(ctx).await,
            None => Ok(()),
        }
    }

    async fn stop(&self, ctx: Context) -> Result<(), BoxError> {
        match &self.on_stop {
            Some(hook) => hook(ctx).await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ServiceFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFn")
            .field("name", &self.name)
            .field("on_start", &self.on_start.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_missing_hooks_succeed() {
        let svc = ServiceFn::new("noop");
        assert!(svc.start(Context::background()).await.is_ok());
        assert!(svc.stop(Context::background()).await.is_ok());
        assert_eq!(svc.name(), "noop");
    }

    #[tokio::test]
    async fn test_hooks_are_called() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let svc = ServiceFn::new("counter")
            .on_start(move |_| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), BoxError>(())
                }
            })
            .on_stop(|_| async { Err::<(), BoxError>("stop failed".into()) });

        assert!(svc.start(Context::background()).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let err = svc.stop(Context::background()).await.unwrap_err();
        assert_eq!(err.to_string(), "stop failed");
    }
}
