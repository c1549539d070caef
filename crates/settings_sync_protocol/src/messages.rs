//! Commit messages exchanged with a section endpoint.

use crate::error::{ProtocolError, ProtocolResult};
use crate::value::{FieldMap, FieldValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the form field that carries the request intent.
pub const ACTION_FIELD: &str = "action";

/// What the endpoint should do with the submitted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Persist the fields.
    Save,
    /// Exercise the committed configuration without persisting anything.
    Test,
}

impl Intent {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Save => "save",
            Intent::Test => "test",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "save" => Ok(Intent::Save),
            "test" => Ok(Intent::Test),
            other => Err(ProtocolError::UnknownIntent(other.to_string())),
        }
    }
}

/// A request to a section endpoint.
///
/// On the wire this is a flat JSON object: the section's fields plus an
/// `action` member naming the intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Requested intent.
    pub intent: Intent,
    /// Submitted fields.
    pub fields: FieldMap,
}

impl CommitRequest {
    /// Creates a save request.
    pub fn save(fields: FieldMap) -> Self {
        Self {
            intent: Intent::Save,
            fields,
        }
    }

    /// Creates a test request.
    pub fn test(fields: FieldMap) -> Self {
        Self {
            intent: Intent::Test,
            fields,
        }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let form = self
            .fields
            .merged(&FieldMap::new().with(ACTION_FIELD, self.intent.as_str()));
        form.encode()
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let form = FieldMap::decode(bytes)?;
        let intent = match form.get(ACTION_FIELD) {
            Some(FieldValue::Text(action)) => action.parse()?,
            Some(FieldValue::Flag(_)) => {
                return Err(ProtocolError::invalid_structure("action must be text"))
            }
            None => return Err(ProtocolError::invalid_structure("missing action")),
        };

        Ok(Self {
            intent,
            fields: form.without(&[ACTION_FIELD]),
        })
    }
}

/// Outcome reported by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    /// The request was applied.
    #[serde(rename = "OK")]
    Ok,
    /// The endpoint understood the request but refused or failed it.
    #[serde(rename = "ERROR")]
    Error,
}

/// Response from a section endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
    /// Result status.
    pub status: ResultStatus,
    /// Error text for `ERROR` responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommitResponse {
    /// Creates a successful response.
    pub fn ok() -> Self {
        Self {
            status: ResultStatus::Ok,
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Error,
            error: Some(message.into()),
        }
    }

    /// Returns true for an `OK` response.
    pub fn is_ok(&self) -> bool {
        self.status == ResultStatus::Ok
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
