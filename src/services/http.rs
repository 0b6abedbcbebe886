//! HTTP health listener as a lifecycle service.
//!
//! # Responsibilities
//! - Bind the listener on start (a bind failure is a start failure)
//! - Serve `GET /healthz` in a background task
//! - On stop, drain in-flight requests via graceful shutdown, bounded by the context

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::lifecycle::{BoxError, Context, Service};

struct Running {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

/// Serves the health endpoint between `start` and `stop`.
pub struct HttpService {
    bind_address: String,
    running: Mutex<Option<Running>>,
}

impl HttpService {
    pub fn new(bind_address: impl Into<String>) -> Self {
        Self {
            bind_address: bind_address.into(),
            running: Mutex::new(None),
        }
    }

    pub fn from_config(config: &HttpConfig) -> Self {
        Self::new(config.bind_address.clone())
    }

    /// Address actually bound, once started.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    fn router() -> Router {
        Router::new()
            .route("/healthz", get(healthz))
            .layer(TraceLayer::new_for_http())
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[async_trait]
impl Service for HttpService {
    fn name(&self) -> &str {
        "http"
    }

    async fn start(&self, _ctx: Context) -> Result<(), BoxError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err("http service already started".into());
        }

        let listener = TcpListener::bind(&self.bind_address).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, Self::router())
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!(address = %local_addr, "HTTP server listening");
        *running = Some(Running {
            local_addr,
            shutdown,
            task,
        });
        Ok(())
    }

    async fn stop(&self, ctx: Context) -> Result<(), BoxError> {
        let Some(running) = self.running.lock().await.take() else {
            return Ok(());
        };

        let _ = running.shutdown.send(());
        tokio::select! {
            joined = running.task => {
                joined??;
                tracing::info!(address = %running.local_addr, "HTTP server stopped");
                Ok(())
            }
            reason = ctx.done() => Err(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_health_until_stopped() {
        let svc = HttpService::new("127.0.0.1:0");
        svc.start(Context::background()).await.unwrap();
        let addr = svc.local_addr().await.unwrap();

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let body = client
            .get(format!("http://{}/healthz", addr))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");

        svc.stop(Context::background()).await.unwrap();
        assert!(svc.local_addr().await.is_none());
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_bind_failure_is_start_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let svc = HttpService::new(taken.local_addr().unwrap().to_string());
        assert!(svc.start(Context::background()).await.is_err());
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let svc = HttpService::new("127.0.0.1:0");
        assert!(svc.stop(Context::background()).await.is_ok());
    }
}
