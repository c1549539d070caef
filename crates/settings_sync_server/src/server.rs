//! Main settings server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::RequestHandler;
use crate::store::{section_fields, SettingsStore};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use settings_sync_protocol::FieldMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Path of the setup document.
pub const SETUP_PATH: &str = "/rest/setup";
/// Path of the status document.
pub const MONITOR_PATH: &str = "/rest/monitor";

/// The settings server.
///
/// Answers the setup document, the per-section commit endpoints under
/// `/rest/setup/<section>` and the status endpoint. It speaks raw bodies so
/// any HTTP front end, or an in-process loopback, can sit in front of it.
///
/// # Example
///
/// ```
/// use settings_sync_server::{ServerConfig, SettingsServer};
///
/// let server = SettingsServer::new(ServerConfig::default());
/// let body = br#"{"timezone":"Asia/Tokyo","action":"save"}"#;
/// let response = server.handle_post("/rest/setup/tz", body).unwrap();
/// assert_eq!(response, br#"{"status":"OK"}"#);
/// ```
pub struct SettingsServer {
    handler: RequestHandler,
    store: Arc<SettingsStore>,
    status: RwLock<Value>,
    failures: Mutex<HashMap<String, ServerError>>,
}

impl SettingsServer {
    /// Creates a new settings server.
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(SettingsStore::new(config.initial.clone()));
        let status = RwLock::new(config.status.clone());
        let handler = RequestHandler::new(config, Arc::clone(&store));

        Self {
            handler,
            store,
            status,
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Handles a GET request and returns the response body.
    pub fn handle_get(&self, path: &str) -> ServerResult<Vec<u8>> {
        let path = normalize(path);
        self.take_failure(path)?;

        match path {
            SETUP_PATH => Ok(self.store.setup_document().encode()?),
            MONITOR_PATH => serde_json::to_vec(&*self.status.read())
                .map_err(|e| ServerError::Internal(e.to_string())),
            _ if section_of(path).is_some() => Err(ServerError::MethodNotAllowed(format!(
                "GET {path}"
            ))),
            _ => Err(ServerError::NotFound(path.to_string())),
        }
    }

    /// Handles a POST request and returns the response body.
    pub fn handle_post(&self, path: &str, body: &[u8]) -> ServerResult<Vec<u8>> {
        let path = normalize(path);
        self.take_failure(path)?;

        match path {
            SETUP_PATH | MONITOR_PATH => {
                Err(ServerError::MethodNotAllowed(format!("POST {path}")))
            }
            _ => {
                let section =
                    section_of(path).ok_or_else(|| ServerError::NotFound(path.to_string()))?;
                let response = self.handler.handle_body(section, body)?;
                Ok(response.encode()?)
            }
        }
    }

    /// Replaces the status document served by the monitor endpoint.
    pub fn set_status(&self, status: Value) {
        *self.status.write() = status;
    }

    /// Current status document.
    pub fn status(&self) -> Value {
        self.status.read().clone()
    }

    /// Fails the next request to `path` with `error`.
    pub fn fail_next(&self, path: &str, error: ServerError) {
        self.failures.lock().insert(normalize(path).to_string(), error);
    }

    /// Returns true if `password` matches the administrator password.
    pub fn verify_admin_password(&self, password: &str) -> bool {
        self.store.verify_admin_password(password)
    }

    /// The setup document as served.
    pub fn setup_document(&self) -> FieldMap {
        self.store.setup_document()
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    fn take_failure(&self, path: &str) -> ServerResult<()> {
        match self.failures.lock().remove(path) {
            Some(error) => {
                warn!(path = %path, error = %error, "injected failure");
                Err(error)
            }
            None => {
                debug!(path = %path, "request");
                Ok(())
            }
        }
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn section_of(path: &str) -> Option<&str> {
    path.strip_prefix(SETUP_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|section| section_fields(section).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use settings_sync_protocol::fields::*;
    use settings_sync_protocol::CommitResponse;

    #[test]
    fn setup_document_roundtrip() {
        let server = SettingsServer::new(ServerConfig::default());
        let body = server.handle_get("/rest/setup").unwrap();
        let document = FieldMap::decode(&body).unwrap();
        assert_eq!(document.text(TIMEZONE), "UTC");
        assert!(!document.contains(PASSWORD));
    }

    #[test]
    fn commit_flow() {
        let server = SettingsServer::new(ServerConfig::default());
        let body = br#"{"password":"secret","action":"save"}"#;
        let response = server.handle_post("/rest/setup/admin/", body).unwrap();

        assert!(CommitResponse::decode(&response).unwrap().is_ok());
        assert!(server.verify_admin_password("secret"));
        assert!(!server.setup_document().contains(PASSWORD));
    }

    #[test]
    fn routing_errors() {
        let server = SettingsServer::new(ServerConfig::default());
        assert_eq!(server.handle_get("/rest/setup/tz").unwrap_err().status_code(), 405);
        assert_eq!(server.handle_post("/rest/monitor", b"{}").unwrap_err().status_code(), 405);
        assert_eq!(
            server.handle_post("/rest/setup/license", b"{}").unwrap_err().status_code(),
            404
        );
        assert_eq!(server.handle_get("/rest/other").unwrap_err().status_code(), 404);
    }

    #[test]
    fn injected_failures_fire_once() {
        let server = SettingsServer::new(ServerConfig::default());
        server.fail_next("/rest/setup/url", ServerError::Internal("disk full".into()));

        let body = br#"{"server-url":"https://a.com","action":"save"}"#;
        let err = server.handle_post("/rest/setup/url", body).unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(server.store().save_count("url"), 0);

        assert!(server.handle_post("/rest/setup/url", body).is_ok());
        assert_eq!(server.store().save_count("url"), 1);
    }

    #[test]
    fn monitor_serves_current_status() {
        let server = SettingsServer::new(ServerConfig::default());
        server.set_status(json!({ "state": "RUNNING", "text": "OK", "color": "green" }));

        let body = server.handle_get("/rest/monitor").unwrap();
        let status: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status["state"], "RUNNING");
        assert_eq!(server.status(), status);
    }
}
