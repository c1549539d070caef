//! Request handlers for the settings endpoints.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::store::SettingsStore;
use settings_sync_protocol::fields::*;
use settings_sync_protocol::{CommitRequest, CommitResponse, FieldMap, Intent, ACTION_FIELD};
use std::sync::Arc;
use tracing::{info, warn};

/// Handler for section commits.
pub struct RequestHandler {
    config: ServerConfig,
    store: Arc<SettingsStore>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(config: ServerConfig, store: Arc<SettingsStore>) -> Self {
        Self { config, store }
    }

    /// Decodes and handles a commit body for `section`.
    pub fn handle_body(&self, section: &str, body: &[u8]) -> ServerResult<CommitResponse> {
        let form = FieldMap::decode(body)?;
        if !form.contains(ACTION_FIELD) {
            return Err(ServerError::InvalidRequest(format!("'{ACTION_FIELD}' missing")));
        }
        let request = CommitRequest::decode(body)
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        self.handle_commit(section, &request)
    }

    /// Handles a decoded commit.
    ///
    /// Refusals come back as `ERROR` responses; only requests the server
    /// cannot route or parse are errors.
    pub fn handle_commit(
        &self,
        section: &str,
        request: &CommitRequest,
    ) -> ServerResult<CommitResponse> {
        match request.intent {
            Intent::Save => self.handle_save(section, &request.fields),
            Intent::Test => self.handle_test(section, &request.fields),
        }
    }

    fn handle_save(&self, section: &str, fields: &FieldMap) -> ServerResult<CommitResponse> {
        if let Some(refusal) = refuse_save(section, fields) {
            warn!(section = %section, reason = %refusal, "save refused");
            return Ok(CommitResponse::error(refusal));
        }

        self.store.apply(section, fields)?;
        info!(section = %section, fields = fields.len(), "section saved");
        Ok(CommitResponse::ok())
    }

    fn handle_test(&self, section: &str, fields: &FieldMap) -> ServerResult<CommitResponse> {
        if section != "mail" {
            return Err(ServerError::InvalidRequest(format!(
                "section {section} has no test action"
            )));
        }
        if fields.is_blank(TEST_EMAIL_RECIPIENT) {
            return Ok(CommitResponse::error("A test recipient is required."));
        }

        info!(recipient = %fields.text(TEST_EMAIL_RECIPIENT), "sending test email");
        match &self.config.mail_test_failure {
            Some(error) => Ok(CommitResponse::error(error.clone())),
            None => Ok(CommitResponse::ok()),
        }
    }
}

fn refuse_save(section: &str, fields: &FieldMap) -> Option<String> {
    match section {
        "admin" if fields.is_blank(PASSWORD) => Some("Password is required.".into()),
        "ssl"
            if fields.flag(ENABLE_SSL)
                && (fields.is_blank(SSL_CERTIFICATE_FILE)
                    || fields.is_blank(SSL_CERTIFICATE_KEY_FILE)) =>
        {
            Some("A certificate and key file are required.".into())
        }
        _ => None,
    }
}
