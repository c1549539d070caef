//! # Settings Sync Engine
//!
//! Section synchronization engine and status monitor for settings pages.
//!
//! This crate provides:
//! - Per-section baselines of the last server-confirmed values
//! - Widget and field accessor contracts, with an in-memory widget host
//! - Section descriptors and eligibility rules for the standard sections
//! - A global dispatcher that re-evaluates every section on any edit
//! - Save, cancel and test actions with an in-flight guard per section
//! - HTTP, loopback and mock transports
//! - A status monitor that broadcasts only real transitions
//!
//! ## Architecture
//!
//! User edits flow one way:
//! 1. A widget reports a change
//! 2. The engine gathers every section and recomputes its affordances
//! 3. Save or cancel runs against the cached affordance state
//! 4. A successful save replaces the section's baseline, then step 2 repeats
//!
//! ## Key Invariants
//!
//! - Affordances are always a cached evaluation, never set by hand
//! - A baseline changes only on load or on a successful save of its section
//! - Sections commit independently
//! - At most one save or test per section is in flight

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod accessor;
mod baseline;
mod config;
mod engine;
mod error;
mod evaluator;
mod feed;
mod http;
mod monitor;
mod notice;
mod rules;
mod section;
mod transport;
mod validate;
mod widget;

pub use accessor::{FieldAccessor, FieldSpec, WidgetAccessor};
pub use baseline::BaselineStore;
pub use config::{EngineConfig, MonitorConfig};
pub use engine::{SettingsEngine, TestOutcome};
pub use error::{Action, ErrorClass, SettingsError, SettingsResult};
pub use evaluator::{evaluate, Affordance, Evaluation};
pub use feed::{Subscriber, SubscriptionId, TopicFeed};
pub use http::{HttpClient, HttpFailure, HttpTransport, LoopbackClient, LoopbackServer};
pub use monitor::{
    MonitorHandle, PollOutcome, StatusIndicator, StatusMonitor, StatusReport, StatusSource,
    DEFAULT_STATUS_COLOR, DEFAULT_STATUS_TEXT,
};
pub use notice::{Notice, NoticeBoard};
pub use rules::{
    AdminRules, ChangeRules, FieldIssue, MailRules, MailServerType, SectionRules, TlsRules,
    UrlRules,
};
pub use section::{ids, standard_sections, SectionDescriptor, SETUP_PREFIX};
pub use settings_sync_protocol::fields;
pub use transport::{MockTransport, SettingsTransport};
pub use validate::{valid_email, valid_port, valid_url};
pub use widget::{ChangeHandler, ChangeSource, MemoryWidgets, WidgetHost, WidgetKind};
