//! Transport abstraction for loading and committing sections.

use crate::error::{SettingsError, SettingsResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use settings_sync_protocol::{CommitRequest, CommitResponse, FieldMap};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A settings transport carries the setup document and section commits.
///
/// This trait abstracts the network layer so the engine can run against HTTP,
/// an in-process server, or a scripted mock.
#[async_trait]
pub trait SettingsTransport: Send + Sync {
    /// Fetches the setup document.
    async fn load(&self, endpoint: &str) -> SettingsResult<FieldMap>;

    /// Sends a commit to a section endpoint.
    async fn request(
        &self,
        endpoint: &str,
        request: &CommitRequest,
    ) -> SettingsResult<CommitResponse>;
}

#[async_trait]
impl<T: SettingsTransport + ?Sized> SettingsTransport for Arc<T> {
    async fn load(&self, endpoint: &str) -> SettingsResult<FieldMap> {
        (**self).load(endpoint).await
    }

    async fn request(
        &self,
        endpoint: &str,
        request: &CommitRequest,
    ) -> SettingsResult<CommitResponse> {
        (**self).request(endpoint, request).await
    }
}

/// A mock transport for testing.
///
/// Commits are answered from a per-endpoint script, falling back to `OK`.
/// Responses can be held back with [`MockTransport::pause`] to observe a
/// commit while it is in flight.
#[derive(Debug)]
pub struct MockTransport {
    connected: AtomicBool,
    setup: Mutex<FieldMap>,
    script: Mutex<HashMap<String, VecDeque<Result<CommitResponse, String>>>>,
    requests: Mutex<Vec<(String, CommitRequest)>>,
    paused: AtomicBool,
    gate: Notify,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            setup: Mutex::new(FieldMap::new()),
            script: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            paused: AtomicBool::new(false),
            gate: Notify::new(),
        }
    }

    /// Sets the setup document.
    pub fn set_setup(&self, setup: FieldMap) {
        *self.setup.lock() = setup;
    }

    /// Queues a response for the next commit to `endpoint`.
    pub fn push_response(&self, endpoint: &str, response: CommitResponse) {
        self.script
            .lock()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(Ok(response));
    }

    /// Queues a transport failure for the next commit to `endpoint`.
    pub fn push_failure(&self, endpoint: &str, message: impl Into<String>) {
        self.script
            .lock()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(Err(message.into()));
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Holds every response until [`MockTransport::resume`].
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Releases held responses.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.gate.notify_waiters();
    }

    /// Commits received so far, in arrival order.
    pub fn requests(&self) -> Vec<(String, CommitRequest)> {
        self.requests.lock().clone()
    }

    /// Number of commits received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Yields until at least `count` commits have arrived.
    pub async fn wait_for_requests(&self, count: usize) {
        while self.request_count() < count {
            tokio::task::yield_now().await;
        }
    }

    async fn wait_until_resumed(&self) {
        loop {
            let released = self.gate.notified();
            if !self.paused.load(Ordering::SeqCst) {
                return;
            }
            released.await;
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsTransport for MockTransport {
    async fn load(&self, _endpoint: &str) -> SettingsResult<FieldMap> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SettingsError::NotConnected);
        }
        Ok(self.setup.lock().clone())
    }

    async fn request(
        &self,
        endpoint: &str,
        request: &CommitRequest,
    ) -> SettingsResult<CommitResponse> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SettingsError::NotConnected);
        }
        self.requests
            .lock()
            .push((endpoint.to_string(), request.clone()));

        self.wait_until_resumed().await;

        let scripted = self
            .script
            .lock()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(SettingsError::transport_retryable(message)),
            None => Ok(CommitResponse::ok()),
        }
    }
}
