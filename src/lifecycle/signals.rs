//! Termination triggers.
//!
//! # Responsibilities
//! - Block the wait phase until the process is asked to stop
//! - Report what asked it to stop
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - OS listeners exist only while `wait` is pending, then are released
//! - SIGINT, SIGTERM and SIGHUP all request shutdown
//! - Tests and embedders use `ManualTrigger` instead of real signals

use std::fmt;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

/// What ended the wait phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Interrupt,
    Terminate,
    Hangup,
    /// Fired through a [`ManualTrigger`].
    Manual,
    /// The root context was cancelled.
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Termination::Interrupt => "SIGINT",
            Termination::Terminate => "SIGTERM",
            Termination::Hangup => "SIGHUP",
            Termination::Manual => "manual trigger",
            Termination::Cancelled => "context cancelled",
        };
        f.write_str(name)
    }
}

/// Source of the "stop now" request that ends the wait phase.
#[async_trait]
pub trait TerminationTrigger: Send + Sync {
    /// Block until termination is requested.
    async fn wait(&self) -> io::Result<Termination>;
}

/// Process signals: SIGINT, SIGTERM and SIGHUP (Ctrl-C elsewhere).
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSignals;

#[cfg(unix)]
#[async_trait]
impl TerminationTrigger for OsSignals {
    async fn wait(&self) -> io::Result<Termination> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let mut hangup = signal(SignalKind::hangup())?;

        let received = tokio::select! {
            _ = interrupt.recv() => Termination::Interrupt,
            _ = terminate.recv() => Termination::Terminate,
            _ = hangup.recv() => Termination::Hangup,
        };
        tracing::debug!(signal = %received, "Signal received");
        Ok(received)
    }
}

#[cfg(not(unix))]
#[async_trait]
impl TerminationTrigger for OsSignals {
    async fn wait(&self) -> io::Result<Termination> {
        tokio::signal::ctrl_c().await?;
        Ok(Termination::Interrupt)
    }
}

/// In-process trigger. Clones share state; firing before anyone waits is not lost.
#[derive(Debug, Clone)]
pub struct ManualTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl ManualTrigger {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request termination.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ManualTrigger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TerminationTrigger for ManualTrigger {
    async fn wait(&self) -> io::Result<Termination> {
        let mut rx = self.tx.subscribe();
        rx.wait_for(|fired| *fired)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e))?;
        Ok(Termination::Manual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_before_wait_is_kept() {
        let trigger = ManualTrigger::new();
        trigger.trigger();
        assert!(trigger.is_triggered());
        assert_eq!(trigger.wait().await.unwrap(), Termination::Manual);
    }

    #[tokio::test]
    async fn test_trigger_from_clone_wakes_waiter() {
        let trigger = ManualTrigger::new();
        let remote = trigger.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            remote.trigger();
        });

        let fired = tokio::time::timeout(Duration::from_secs(2), trigger.wait())
            .await
            .expect("trigger should fire");
        assert_eq!(fired.unwrap(), Termination::Manual);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_os_signals_report_hangup() {
        let waiter = tokio::spawn(async { OsSignals.wait().await });
        // Let the listeners register before the signal is sent.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let status = std::process::Command::new("kill")
            .args(["-HUP", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let received = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("SIGHUP should end the wait")
            .unwrap();
        assert_eq!(received.unwrap(), Termination::Hangup);
    }

    #[tokio::test]
    async fn test_untriggered_wait_blocks() {
        let trigger = ManualTrigger::new();
        let res = tokio::time::timeout(Duration::from_millis(30), trigger.wait()).await;
        assert!(res.is_err());
    }
}
