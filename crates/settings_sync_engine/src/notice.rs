//! Per-section record of the last surfaced failure.

use crate::error::{Action, ErrorClass, SettingsError};
use parking_lot::RwLock;
use std::collections::HashMap;

/// A failure shown to the user for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Action that failed.
    pub action: Action,
    /// How the failure is presented.
    pub class: ErrorClass,
    /// Text to render.
    pub message: String,
}

impl Notice {
    /// Builds the notice for a failed action.
    ///
    /// Transport failures render their page-level message
    /// (`"<url>: <status> (<reason>)"`); server errors render verbatim.
    pub fn from_error(action: Action, error: &SettingsError) -> Self {
        let message = match error {
            SettingsError::Transport { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            action,
            class: error.class(),
            message,
        }
    }
}

/// Holds the latest notice per section.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: RwLock<HashMap<String, Notice>>,
}

impl NoticeBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure, replacing any earlier notice for the section.
    pub fn record(&self, section: &str, action: Action, error: &SettingsError) {
        self.notices
            .write()
            .insert(section.to_string(), Notice::from_error(action, error));
    }

    /// Clears a section's notice.
    pub fn clear(&self, section: &str) {
        self.notices.write().remove(section);
    }

    /// Returns a section's notice.
    pub fn get(&self, section: &str) -> Option<Notice> {
        self.notices.read().get(section).cloned()
    }

    /// Number of sections with a notice.
    pub fn len(&self) -> usize {
        self.notices.read().len()
    }

    /// Returns true if no section has a notice.
    pub fn is_empty(&self) -> bool {
        self.notices.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_is_page_level() {
        let board = NoticeBoard::new();
        board.record(
            "url",
            Action::Save,
            &SettingsError::transport_retryable("/rest/setup/url: 500 (Internal Server Error)"),
        );

        let notice = board.get("url").unwrap();
        assert_eq!(notice.class, ErrorClass::Transport);
        assert_eq!(notice.message, "/rest/setup/url: 500 (Internal Server Error)");
    }

    #[test]
    fn latest_notice_wins_and_clears() {
        let board = NoticeBoard::new();
        board.record("mail", Action::Save, &SettingsError::Timeout);
        board.record("mail", Action::Save, &SettingsError::Server("relay refused".into()));

        let notice = board.get("mail").unwrap();
        assert_eq!(notice.class, ErrorClass::ServerLogic);
        assert_eq!(notice.message, "relay refused");
        assert_eq!(board.len(), 1);

        board.clear("mail");
        assert!(board.is_empty());
    }
}
