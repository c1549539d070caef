//! Error types for the settings engine.

use settings_sync_protocol::ProtocolError;
use std::fmt;
use thiserror::Error;

/// Result type for engine operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// A user-triggered section action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Persist the section.
    Save,
    /// Restore the section from its baseline.
    Cancel,
    /// Exercise the committed configuration.
    Test,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Save => "save",
            Action::Cancel => "cancel",
            Action::Test => "test",
        })
    }
}

/// How a failure is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network, HTTP or decoding failure; shown as a page-level message.
    Transport,
    /// The server answered `ERROR`; its text is shown verbatim.
    ServerLogic,
    /// The caller asked for something the current state does not allow.
    Usage,
}

/// Errors that can occur while loading, committing or polling.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Network or HTTP failure.
    #[error("transport error: {message}")]
    Transport {
        /// Page-level message, e.g. `"/rest/setup/url: 500 (Internal Server Error)"`.
        message: String,
        /// Whether the request can be retried.
        retryable: bool,
    },

    /// The endpoint answered with `status: ERROR`.
    #[error("{0}")]
    Server(String),

    /// Malformed request or response body.
    #[error("codec error: {0}")]
    Codec(#[from] ProtocolError),

    /// The transport gave up waiting.
    #[error("operation timed out")]
    Timeout,

    /// The transport has been closed.
    #[error("not connected to server")]
    NotConnected,

    /// No section is registered under this id.
    #[error("unknown section: {0}")]
    UnknownSection(String),

    /// A section with this id is already registered.
    #[error("duplicate section: {0}")]
    DuplicateSection(String),

    /// A save or test for this section has not resolved yet.
    #[error("a commit for section {0} is already in flight")]
    CommitInFlight(String),

    /// The section's affordance for this action is disabled.
    #[error("{action} is not available for section {section}")]
    NotEligible {
        /// Section id.
        section: String,
        /// Rejected action.
        action: Action,
    },
}

impl SettingsError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SettingsError::Transport { retryable, .. } => *retryable,
            SettingsError::Timeout => true,
            SettingsError::Server(_) => true,
            _ => false,
        }
    }

    /// Classifies the error for presentation.
    pub fn class(&self) -> ErrorClass {
        match self {
            SettingsError::Transport { .. }
            | SettingsError::Codec(_)
            | SettingsError::Timeout
            | SettingsError::NotConnected => ErrorClass::Transport,
            SettingsError::Server(_) => ErrorClass::ServerLogic,
            SettingsError::UnknownSection(_)
            | SettingsError::DuplicateSection(_)
            | SettingsError::CommitInFlight(_)
            | SettingsError::NotEligible { .. } => ErrorClass::Usage,
        }
    }

    /// Short status text in the style of an XHR `textStatus`.
    pub fn status_text(&self) -> &'static str {
        match self {
            SettingsError::Timeout => "timeout",
            SettingsError::Codec(_) => "parsererror",
            _ => "error",
        }
    }
}
