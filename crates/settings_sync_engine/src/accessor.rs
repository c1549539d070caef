//! Translation between a section's widgets and its `FieldMap`.

use crate::widget::{WidgetHost, WidgetKind};
use settings_sync_protocol::FieldMap;
use std::sync::Arc;

/// Reads a section's values from its widgets and writes them back.
pub trait FieldAccessor: Send + Sync {
    /// Returns a fresh snapshot of the section's fields.
    ///
    /// Every declared field is present in the result; hidden or missing
    /// controls report their kind's default (`""` or `false`).
    fn gather(&self) -> FieldMap;

    /// Writes the fields present in `fields` to their widgets.
    ///
    /// Fields the section does not own are skipped. Idempotent, and never
    /// triggers a change notification.
    fn set_all(&self, fields: &FieldMap);

    /// Returns true if the section's controls exist on the page.
    fn is_present(&self) -> bool {
        true
    }
}

/// A field owned by a section, with the kind of control that edits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field id, shared by the widget and the wire name.
    pub id: String,
    /// Control kind.
    pub kind: WidgetKind,
}

impl FieldSpec {
    /// A text input.
    pub fn text(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: WidgetKind::Text,
        }
    }

    /// An on/off switch.
    pub fn switch(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: WidgetKind::Switch,
        }
    }

    /// A dropdown.
    pub fn choice(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: WidgetKind::Choice,
        }
    }
}

/// A `FieldAccessor` over a list of widgets on a `WidgetHost`.
pub struct WidgetAccessor {
    host: Arc<dyn WidgetHost>,
    fields: Vec<FieldSpec>,
}

impl WidgetAccessor {
    /// Creates an accessor for the given fields.
    pub fn new(host: Arc<dyn WidgetHost>, fields: Vec<FieldSpec>) -> Self {
        Self { host, fields }
    }

    /// Declared fields.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

impl FieldAccessor for WidgetAccessor {
    fn gather(&self) -> FieldMap {
        self.fields
            .iter()
            .map(|spec| {
                let value = self
                    .host
                    .get_value(&spec.id)
                    .map(|v| spec.kind.coerce(v))
                    .unwrap_or_else(|| spec.kind.default_value());
                (spec.id.clone(), value)
            })
            .collect()
    }

    fn set_all(&self, fields: &FieldMap) {
        for spec in &self.fields {
            if let Some(value) = fields.get(&spec.id) {
                self.host.set_value(&spec.id, spec.kind.coerce(value.clone()));
            }
        }
    }

    fn is_present(&self) -> bool {
        self.fields
            .iter()
            .any(|spec| self.host.get_value(&spec.id).is_some())
    }
}
