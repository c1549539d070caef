//! Server status polling with change-only broadcast.
//!
//! The monitor fetches the status document at a fixed interval and publishes
//! it on its topic only when its serialized form differs from the last one
//! published. Transport failures are turned into a synthetic `{"text": kind}`
//! status and go through the same dedupe.

use crate::config::MonitorConfig;
use crate::error::SettingsResult;
use crate::feed::TopicFeed;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Fallback indicator text.
pub const DEFAULT_STATUS_TEXT: &str = "ERROR";
/// Fallback indicator color.
pub const DEFAULT_STATUS_COLOR: &str = "red";

/// A source of server status documents.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetches the current status.
    async fn status(&self, endpoint: &str) -> SettingsResult<Value>;
}

#[async_trait]
impl<T: StatusSource + ?Sized> StatusSource for Arc<T> {
    async fn status(&self, endpoint: &str) -> SettingsResult<Value> {
        (**self).status(endpoint).await
    }
}

/// Text and color shown by the status indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIndicator {
    /// Indicator label.
    pub text: String,
    /// Indicator color.
    pub color: String,
}

/// A status document as served by the monitor endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    value: Value,
}

impl StatusReport {
    /// Wraps a status document.
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Synthetic status for a failed poll; `kind` is `error`, `timeout` or
    /// `parsererror`.
    pub fn error(kind: &str) -> Self {
        Self::new(json!({ "text": kind }))
    }

    /// Raw document.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Deterministic serialization used for dedupe.
    ///
    /// Object keys come out sorted because `serde_json::Map` is ordered by key.
    pub fn serialized(&self) -> String {
        self.value.to_string()
    }

    /// The `state` field.
    pub fn state(&self) -> Option<&str> {
        self.value.get("state").and_then(Value::as_str)
    }

    /// Returns true if `allowable-actions` lists `action`.
    pub fn allows(&self, action: &str) -> bool {
        self.value
            .get("allowable-actions")
            .and_then(Value::as_array)
            .map(|actions| actions.iter().any(|a| a.as_str() == Some(action)))
            .unwrap_or(false)
    }

    /// Indicator text and color, defaulting when absent or `"none"`.
    pub fn indicator(&self) -> StatusIndicator {
        StatusIndicator {
            text: self.member_or("text", DEFAULT_STATUS_TEXT),
            color: self.member_or("color", DEFAULT_STATUS_COLOR),
        }
    }

    fn member_or(&self, name: &str, fallback: &str) -> String {
        match self.value.get(name).and_then(Value::as_str) {
            Some(v) if v != "none" => v.to_string(),
            _ => fallback.to_string(),
        }
    }
}

impl From<Value> for StatusReport {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The status changed and was broadcast.
    Published {
        /// The new status.
        report: StatusReport,
        /// Number of subscribers reached.
        delivered: usize,
    },
    /// The status matched the last broadcast.
    Unchanged,
}

impl PollOutcome {
    /// Returns true if the poll broadcast a transition.
    pub fn is_published(&self) -> bool {
        matches!(self, PollOutcome::Published { .. })
    }
}

/// Polls a status source and broadcasts transitions.
pub struct StatusMonitor<S: StatusSource> {
    source: S,
    config: MonitorConfig,
    feed: Arc<TopicFeed<StatusReport>>,
    last_serialized: Mutex<Option<String>>,
}

impl<S: StatusSource> StatusMonitor<S> {
    /// Creates a monitor publishing on `feed`.
    pub fn new(source: S, config: MonitorConfig, feed: Arc<TopicFeed<StatusReport>>) -> Self {
        Self {
            source,
            config,
            feed,
            last_serialized: Mutex::new(None),
        }
    }

    /// The feed transitions are published on.
    pub fn feed(&self) -> &Arc<TopicFeed<StatusReport>> {
        &self.feed
    }

    /// Configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Serialization of the last broadcast status.
    pub fn last_serialized(&self) -> Option<String> {
        self.last_serialized.lock().clone()
    }

    /// Fetches the status once and broadcasts it if it changed.
    pub async fn poll_once(&self) -> PollOutcome {
        let report = match self.source.status(&self.config.endpoint).await {
            Ok(value) => StatusReport::new(value),
            Err(err) => {
                warn!(endpoint = %self.config.endpoint, error = %err, "status poll failed");
                StatusReport::error(err.status_text())
            }
        };

        let serialized = report.serialized();
        {
            let mut last = self.last_serialized.lock();
            if last.as_deref() == Some(serialized.as_str()) {
                return PollOutcome::Unchanged;
            }
            *last = Some(serialized);
        }

        let delivered = self.feed.publish(&self.config.topic, &report);
        debug!(topic = %self.config.topic, delivered, state = ?report.state(), "status changed");
        PollOutcome::Published { report, delivered }
    }
}

impl<S: StatusSource + 'static> StatusMonitor<S> {
    /// Starts polling on its own task.
    ///
    /// The next poll is scheduled only after the current one completes.
    /// Polling stops when the handle is shut down or dropped.
    pub fn spawn(self: Arc<Self>) -> MonitorHandle {
        let (shutdown, mut stop) = oneshot::channel::<()>();
        let interval = self.config.interval;

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop => break,
                    _ = self.poll_once() => {}
                }
                tokio::select! {
                    biased;
                    _ = &mut stop => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!(endpoint = %self.config.endpoint, "status monitor stopped");
        });

        MonitorHandle {
            shutdown: Some(shutdown),
            task,
        }
    }
}

/// Controls a running status monitor.
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stops polling and waits for the task to finish.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = (&mut self.task).await;
    }

    /// Returns true once the polling task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
