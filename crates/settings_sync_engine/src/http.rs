//! HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait so the transport can run
//! over any HTTP library, or in-process against a loopback server.

use crate::config::EngineConfig;
use crate::error::{SettingsError, SettingsResult};
use crate::monitor::StatusSource;
use crate::transport::SettingsTransport;
use async_trait::async_trait;
use parking_lot::RwLock;
use settings_sync_protocol::{CommitRequest, CommitResponse, FieldMap, ProtocolError};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

/// A failed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    /// Response status, or `None` if no response arrived.
    pub status: Option<u16>,
    /// Reason phrase or network error text.
    pub reason: String,
}

impl HttpFailure {
    /// A failure with an HTTP status.
    pub fn status(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            reason: reason.into(),
        }
    }

    /// A failure before any response arrived.
    pub fn network(reason: impl Into<String>) -> Self {
        Self {
            status: None,
            reason: reason.into(),
        }
    }

    /// Returns true if repeating the request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self.status {
            None => true,
            Some(code) => code >= 500 || code == 408 || code == 429,
        }
    }

    /// Page-level message: `"<url>: <status> (<reason>)"`.
    pub fn describe(&self, url: &str) -> String {
        format!("{url}: {} ({})", self.status.unwrap_or(0), self.reason)
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.status.unwrap_or(0), self.reason)
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response body.
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpFailure>;

    /// Sends a POST request with a JSON body and returns the response body.
    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, HttpFailure>;
}

/// HTTP-based settings transport.
///
/// Uses JSON request and response bodies. Every exchange is bounded by the
/// request timeout.
pub struct HttpTransport<C: HttpClient> {
    /// Base URL of the settings server (e.g., "https://palette.example.com").
    base_url: String,
    /// HTTP client implementation.
    client: C,
    /// Per-exchange timeout.
    timeout: Duration,
    /// Connection state.
    connected: AtomicBool,
    /// Last error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport with a 30 second timeout.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            timeout: Duration::from_secs(30),
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Creates a transport from an engine configuration.
    pub fn from_config(config: &EngineConfig, client: C) -> Self {
        Self::new(config.base_url.clone(), client).with_timeout(config.request_timeout)
    }

    /// Sets the per-exchange timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Returns true until the transport is closed.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Closes the transport; later exchanges fail with `NotConnected`.
    pub fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn set_error(&self, err: &str) {
        *self.last_error.write() = Some(err.to_string());
    }

    fn clear_error(&self) {
        *self.last_error.write() = None;
    }

    async fn exchange(&self, endpoint: &str, body: Option<Vec<u8>>) -> SettingsResult<Vec<u8>> {
        if !self.is_connected() {
            return Err(SettingsError::NotConnected);
        }

        let url = format!("{}{}", self.base_url, endpoint);
        let call = match body {
            Some(body) => self.client.post(&url, body),
            None => self.client.get(&url),
        };

        match tokio::time::timeout(self.timeout, call).await {
            Err(_) => {
                self.set_error(&format!("{url}: timeout"));
                Err(SettingsError::Timeout)
            }
            Ok(Err(failure)) => {
                let message = failure.describe(&url);
                self.set_error(&message);
                Err(if failure.is_retryable() {
                    SettingsError::transport_retryable(message)
                } else {
                    SettingsError::transport_fatal(message)
                })
            }
            Ok(Ok(bytes)) => {
                self.clear_error();
                Ok(bytes)
            }
        }
    }
}

#[async_trait]
impl<C: HttpClient> SettingsTransport for HttpTransport<C> {
    async fn load(&self, endpoint: &str) -> SettingsResult<FieldMap> {
        let bytes = self.exchange(endpoint, None).await?;
        Ok(FieldMap::decode(&bytes)?)
    }

    async fn request(
        &self,
        endpoint: &str,
        request: &CommitRequest,
    ) -> SettingsResult<CommitResponse> {
        let body = request.encode()?;
        let bytes = self.exchange(endpoint, Some(body)).await?;
        Ok(CommitResponse::decode(&bytes)?)
    }
}

#[async_trait]
impl<C: HttpClient> StatusSource for HttpTransport<C> {
    async fn status(&self, endpoint: &str) -> SettingsResult<serde_json::Value> {
        let bytes = self.exchange(endpoint, None).await?;
        let value = serde_json::from_slice(&bytes).map_err(ProtocolError::from)?;
        Ok(value)
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer: Send + Sync {
    /// Handles a GET request and returns the response body.
    fn handle_get(&self, path: &str) -> Result<Vec<u8>, HttpFailure>;

    /// Handles a POST request and returns the response body.
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, HttpFailure>;
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the server.
    pub fn server(&self) -> &S {
        &self.server
    }

    fn path(url: &str) -> String {
        match Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url.to_string(),
        }
    }
}

#[async_trait]
impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpFailure> {
        self.server.handle_get(&Self::path(url))
    }

    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, HttpFailure> {
        self.server.handle_post(&Self::path(url), &body)
    }
}
