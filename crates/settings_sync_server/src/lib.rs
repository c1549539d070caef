//! # Settings Sync Server
//!
//! Reference in-memory settings store for the settings sync engine.
//!
//! This crate provides:
//! - The setup document endpoint (`GET /rest/setup`)
//! - Per-section commit endpoints (`POST /rest/setup/<section>`) with save
//!   and test intents
//! - A settable status document (`GET /rest/monitor`)
//! - Administrator passwords stored only as SHA-256 digests
//! - One-shot failure injection per endpoint for tests
//!
//! # Architecture
//!
//! The server speaks raw request and response bodies. It carries no HTTP
//! stack of its own; a front end or an in-process loopback routes paths to
//! [`SettingsServer::handle_get`] and [`SettingsServer::handle_post`].
//!
//! Passwords and uploaded certificate file names are never echoed back in
//! the setup document.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod server;
mod store;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use server::{SettingsServer, MONITOR_PATH, SETUP_PATH};
pub use store::{section_fields, SettingsStore, SECTIONS, WITHHELD_FIELDS};
