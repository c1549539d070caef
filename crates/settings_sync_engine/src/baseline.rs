//! Last server-confirmed values per section.

use parking_lot::RwLock;
use settings_sync_protocol::FieldMap;
use std::collections::HashMap;

/// Holds one baseline `FieldMap` per section.
///
/// This is a plain value holder: it performs no validation and never merges.
/// Only the engine writes to it, on initial load and after a successful save.
#[derive(Debug, Default)]
pub struct BaselineStore {
    baselines: RwLock<HashMap<String, FieldMap>>,
}

impl BaselineStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a section's baseline.
    pub fn get(&self, section: &str) -> Option<FieldMap> {
        self.baselines.read().get(section).cloned()
    }

    /// Replaces a section's baseline.
    pub fn set(&self, section: &str, baseline: FieldMap) {
        self.baselines.write().insert(section.to_string(), baseline);
    }

    /// Returns true if the section has a baseline.
    pub fn contains(&self, section: &str) -> bool {
        self.baselines.read().contains_key(section)
    }

    /// Number of sections with a baseline.
    pub fn len(&self) -> usize {
        self.baselines.read().len()
    }

    /// Returns true if no baseline has been recorded.
    pub fn is_empty(&self) -> bool {
        self.baselines.read().is_empty()
    }
}
