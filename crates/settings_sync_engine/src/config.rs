//! Configuration for the settings engine and status monitor.

use std::time::Duration;

/// Configuration for the settings engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL prepended to every endpoint by HTTP transports.
    pub base_url: String,
    /// Endpoint that serves the initial setup document.
    pub setup_endpoint: String,
    /// Request timeout applied by HTTP transports.
    pub request_timeout: Duration,
}

impl EngineConfig {
    /// Creates a new engine configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            setup_endpoint: "/rest/setup".into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the setup endpoint.
    pub fn with_setup_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.setup_endpoint = endpoint.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new("")
    }
}

/// Configuration for the status monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Status endpoint.
    pub endpoint: String,
    /// Delay between the end of one poll and the start of the next.
    pub interval: Duration,
    /// Topic that status transitions are published on.
    pub topic: String,
}

impl MonitorConfig {
    /// Creates a monitor configuration for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            interval: Duration::from_millis(1000),
            topic: "state".into(),
        }
    }

    /// Sets the poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the broadcast topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new("/rest/monitor")
    }
}
