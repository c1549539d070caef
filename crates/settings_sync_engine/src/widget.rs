//! Widget contracts and an in-memory widget host.
//!
//! The engine never touches concrete controls. It reads and writes values by
//! field id through `WidgetHost` and learns about user edits through
//! `ChangeSource`. Writes made through `set_value` are silent so restoring a
//! section cannot feed back into the dispatcher.

use parking_lot::RwLock;
use settings_sync_protocol::FieldValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked, without payload, after every user-driven value change.
pub type ChangeHandler = Arc<dyn Fn() + Send + Sync>;

/// The kind of control behind a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    /// Text input.
    Text,
    /// On/off toggle switch.
    Switch,
    /// Dropdown option picker.
    Choice,
}

impl WidgetKind {
    /// Value reported for a missing or hidden control of this kind.
    pub fn default_value(&self) -> FieldValue {
        match self {
            WidgetKind::Text | WidgetKind::Choice => FieldValue::empty(),
            WidgetKind::Switch => FieldValue::Flag(false),
        }
    }

    /// Coerces a raw value into this kind's shape.
    pub fn coerce(&self, value: FieldValue) -> FieldValue {
        match (self, value) {
            (WidgetKind::Switch, value) => FieldValue::Flag(value.as_flag()),
            (_, FieldValue::Flag(b)) => FieldValue::Text(b.to_string()),
            (_, text) => text,
        }
    }
}

/// Read/write access to widget values by field id.
pub trait WidgetHost: Send + Sync {
    /// Returns the current value, or `None` if no such widget exists.
    fn get_value(&self, field: &str) -> Option<FieldValue>;

    /// Sets a widget's value. Must not emit a change notification.
    fn set_value(&self, field: &str, value: FieldValue);
}

/// A source of change notifications.
pub trait ChangeSource: Send + Sync {
    /// Registers a handler called after every user-driven change.
    fn on_change(&self, handler: ChangeHandler);
}

/// An in-memory widget host for tests and headless use.
#[derive(Default)]
pub struct MemoryWidgets {
    values: RwLock<HashMap<String, FieldValue>>,
    handlers: RwLock<Vec<ChangeHandler>>,
}

impl MemoryWidgets {
    /// Creates a host with no widgets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host with the given widgets present.
    pub fn with_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let host = Self::new();
        {
            let mut values = host.values.write();
            for (k, v) in fields {
                values.insert(k.into(), v.into());
            }
        }
        host
    }

    /// Adds a widget without notifying.
    pub fn add(&self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.write().insert(field.into(), value.into());
    }

    /// Returns true if the widget exists.
    pub fn has(&self, field: &str) -> bool {
        self.values.read().contains_key(field)
    }

    /// Simulates a user edit: updates the value, then notifies every handler.
    pub fn edit(&self, field: &str, value: impl Into<FieldValue>) {
        self.values.write().insert(field.to_string(), value.into());
        self.notify();
    }

    /// Number of registered change handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    fn notify(&self) {
        // Handlers read widgets back, so the lock must be released first.
        let handlers: Vec<ChangeHandler> = self.handlers.read().clone();
        for handler in handlers {
            handler();
        }
    }
}

impl WidgetHost for MemoryWidgets {
    fn get_value(&self, field: &str) -> Option<FieldValue> {
        self.values.read().get(field).cloned()
    }

    fn set_value(&self, field: &str, value: FieldValue) {
        self.values.write().insert(field.to_string(), value);
    }
}

impl ChangeSource for MemoryWidgets {
    fn on_change(&self, handler: ChangeHandler) {
        self.handlers.write().push(handler);
    }
}
