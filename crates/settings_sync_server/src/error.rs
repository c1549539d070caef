//! Error types for the settings server.

use settings_sync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the settings server.
///
/// These become HTTP failures. A request the server understood but refused
/// is answered with an `ERROR` commit response instead.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed JSON body.
    #[error("malformed body: {0}")]
    Codec(#[from] ProtocolError),

    /// No handler for the path.
    #[error("not found: {0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// The backend is unreachable.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::Codec(_)
                | ServerError::NotFound(_)
                | ServerError::MethodNotAllowed(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServerError::Internal(_) | ServerError::Unavailable(_))
    }

    /// HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) | ServerError::Codec(_) => 400,
            ServerError::NotFound(_) => 404,
            ServerError::MethodNotAllowed(_) => 405,
            ServerError::Internal(_) => 500,
            ServerError::Unavailable(_) => 503,
        }
    }

    /// HTTP reason phrase.
    pub fn reason(&self) -> &'static str {
        match self.status_code() {
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            503 => "Service Unavailable",
            _ => "Internal Server Error",
        }
    }
}
