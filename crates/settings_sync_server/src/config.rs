//! Server configuration.

use serde_json::{json, Value};
use settings_sync_protocol::fields::*;
use settings_sync_protocol::FieldMap;

/// Configuration for the settings server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Settings the store starts with.
    pub initial: FieldMap,
    /// Error returned by mail tests; `None` makes them pass.
    pub mail_test_failure: Option<String>,
    /// Status document served before any `set_status`.
    pub status: Value,
}

impl ServerConfig {
    /// Creates a configuration with the given initial settings.
    pub fn new(initial: FieldMap) -> Self {
        Self {
            initial,
            mail_test_failure: None,
            status: json!({
                "state": "STOPPED",
                "allowable-actions": ["start"],
                "text": "STOPPED",
                "color": "red",
            }),
        }
    }

    /// Sets the initial settings.
    pub fn with_initial(mut self, initial: FieldMap) -> Self {
        self.initial = initial;
        self
    }

    /// Makes every mail test fail with `error`.
    pub fn with_mail_test_failure(mut self, error: impl Into<String>) -> Self {
        self.mail_test_failure = Some(error.into());
        self
    }

    /// Sets the initial status document.
    pub fn with_status(mut self, status: Value) -> Self {
        self.status = status;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(
            FieldMap::new()
                .with(SERVER_URL, "")
                .with(TABLEAU_SERVER_URL, "")
                .with(MAIL_SERVER_TYPE, "none")
                .with(ALERT_EMAIL_NAME, "")
                .with(ALERT_EMAIL_ADDRESS, "")
                .with(SMTP_SERVER, "")
                .with(SMTP_PORT, "")
                .with(SMTP_USERNAME, "")
                .with(ENABLE_SSL, false)
                .with(TIMEZONE, "UTC")
                .with(AUTHENTICATION_TYPE, "local"),
        )
    }
}
