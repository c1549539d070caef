//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding protocol messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Failed to encode a message to JSON.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode JSON bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// The JSON was well-formed but not shaped like the expected message.
    #[error("invalid message structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// The `action` field named an intent this protocol does not know.
    #[error("unknown intent: {0}")]
    UnknownIntent(String),
}

impl ProtocolError {
    /// Creates an invalid-structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Self::DecodingFailed {
                message: err.to_string(),
            }
        } else {
            Self::EncodingFailed {
                message: err.to_string(),
            }
        }
    }
}
