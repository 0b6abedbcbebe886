//! Shared utilities for lifecycle integration tests.

use std::sync::{Arc, Mutex};

use app_lifecycle::lifecycle::{BoxError, Context, Service};
use async_trait::async_trait;

/// Ordered record of every start/stop call, shared by all recorders in a test.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// What a recorder does when called.
#[derive(Clone, Copy)]
#[allow(dead_code)]
pub enum Behavior {
    Succeed,
    Fail(&'static str),
    /// Never returns and ignores its context.
    Hang,
    /// Unwinds without reporting a result.
    Panic,
}

impl Behavior {
    async fn act(self) -> Result<(), BoxError> {
        match self {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(msg) => Err(msg.into()),
            Behavior::Hang => std::future::pending().await,
            Behavior::Panic => panic!("service crashed"),
        }
    }
}

/// A service that logs `<name>.start` / `<name>.stop` and then behaves as told.
pub struct Recorder {
    name: String,
    log: CallLog,
    on_start: Behavior,
    on_stop: Behavior,
}

#[allow(dead_code)]
impl Recorder {
    pub fn ok(name: &str, log: &CallLog) -> Self {
        Self::new(name, log, Behavior::Succeed, Behavior::Succeed)
    }

    pub fn new(name: &str, log: &CallLog, on_start: Behavior, on_stop: Behavior) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            on_start,
            on_stop,
        }
    }
}

#[async_trait]
impl Service for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, _ctx: Context) -> Result<(), BoxError> {
        self.log.push(format!("{}.start", self.name));
        self.on_start.act().await
    }

    async fn stop(&self, _ctx: Context) -> Result<(), BoxError> {
        self.log.push(format!("{}.stop", self.name));
        self.on_stop.act().await
    }
}

/// Render calls the way assertions spell them: `["a.start", "b.start"]`.
#[allow(dead_code)]
pub fn calls(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
