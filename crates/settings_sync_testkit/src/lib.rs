//! # Settings Sync Testkit
//!
//! Test utilities for the settings sync engine.
//!
//! This crate provides:
//! - A fully populated settings page over mock or loopback transports
//! - Property-based generators for edits and setup documents
//! - Page invariant checks shared by property and fuzz tests
//! - Fuzz harnesses for the wire codec and the reference server
//!
//! ## Usage
//!
//! ```rust,ignore
//! use settings_sync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn edit_then_cancel() {
//!     let page = TestPage::mock().await;
//!     page.widgets.edit(fields::TIMEZONE, "Asia/Tokyo");
//!     page.engine.cancel(ids::TZ).unwrap();
//!     check_page(&page).unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod invariants;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::invariants::*;
    pub use settings_sync_engine::{fields, ids};
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use invariants::*;
