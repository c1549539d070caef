//! # Settings Sync Protocol
//!
//! Data types and JSON codecs shared by the settings sync engine and the
//! reference settings server.
//!
//! This crate provides:
//! - `FieldValue` and `FieldMap` snapshots of a section's inputs
//! - `Comparison` rules for deep equality with inactive fields ignored
//! - Commit messages (`CommitRequest`, `CommitResponse`) with an explicit `Intent`
//! - JSON encoding/decoding for the wire
//! - Wire names of the standard settings fields (`fields`)
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compare;
mod error;
pub mod fields;
mod messages;
mod value;

pub use compare::{Comparison, InactiveRule};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{CommitRequest, CommitResponse, Intent, ResultStatus, ACTION_FIELD};
pub use value::{FieldMap, FieldValue};
