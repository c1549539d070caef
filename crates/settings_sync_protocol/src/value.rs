//! Field values and field maps.
//!
//! A `FieldMap` is an immutable-by-convention snapshot of a section's inputs.
//! Keys are kept sorted so equality and serialization never depend on the
//! order in which widgets were read.

use crate::error::{ProtocolError, ProtocolResult};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// A primitive input value.
///
/// Text inputs and option pickers produce `Text`; toggle switches produce
/// `Flag`. Enum choices travel as their string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    /// Free text or a selected option.
    Text(String),
    /// On/off switch state.
    Flag(bool),
}

impl FieldValue {
    /// The empty text value.
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    /// Returns the text, or `None` for a flag.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Flag(_) => None,
        }
    }

    /// Interprets the value as a boolean.
    ///
    /// Text is read leniently: `true`, `yes`, `1` and `checked` (any case,
    /// surrounding whitespace ignored) are on, everything else is off.
    pub fn as_flag(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "1" | "checked"
            ),
        }
    }

    /// Returns true for empty text or a `false` flag.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Flag(b) => !*b,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Flag(b) => serializer.serialize_bool(*b),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

/// Accepts the primitives a settings endpoint may send. Numbers become their
/// decimal text and `null` becomes empty text, so a port sent as `25` reads the
/// same as one typed into a text input.
struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, boolean, number or null")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FieldValue, E> {
        Ok(FieldValue::Flag(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::empty())
    }

    fn visit_none<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::empty())
    }
}

/// A snapshot of named field values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldMap {
    /// Creates an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    /// Returns the raw value for a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns true if the field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the text of a field, or `""` when absent or not text.
    pub fn text(&self, name: &str) -> &str {
        self.fields
            .get(name)
            .and_then(FieldValue::as_text)
            .unwrap_or("")
    }

    /// Returns the flag state of a field, `false` when absent.
    pub fn flag(&self, name: &str) -> bool {
        self.fields.get(name).map(FieldValue::as_flag).unwrap_or(false)
    }

    /// Returns true if the field is absent or blank.
    pub fn is_blank(&self, name: &str) -> bool {
        self.fields.get(name).map(FieldValue::is_blank).unwrap_or(true)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    /// Iterates field names in key order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns a copy without the named fields.
    pub fn without(&self, names: &[&str]) -> FieldMap {
        FieldMap {
            fields: self
                .fields
                .iter()
                .filter(|(k, _)| !names.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Returns a copy holding only the named fields that are present.
    pub fn subset(&self, names: &[&str]) -> FieldMap {
        FieldMap {
            fields: self
                .fields
                .iter()
                .filter(|(k, _)| names.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Returns a copy with `other`'s fields layered on top.
    pub fn merged(&self, other: &FieldMap) -> FieldMap {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        FieldMap { fields }
    }

    /// Encodes to a JSON object.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from a JSON object.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        Self::from_json(value)
    }

    /// Builds a field map from a JSON object.
    ///
    /// Nested arrays and objects are not field values; they are skipped so a
    /// setup document may carry extra structure (option lists, version info)
    /// alongside its fields.
    pub fn from_json(value: serde_json::Value) -> ProtocolResult<Self> {
        let serde_json::Value::Object(object) = value else {
            return Err(ProtocolError::invalid_structure("expected a JSON object"));
        };

        let mut fields = BTreeMap::new();
        for (name, value) in object {
            if value.is_array() || value.is_object() {
                continue;
            }
            let value: FieldValue = serde_json::from_value(value)?;
            fields.insert(name, value);
        }
        Ok(FieldMap { fields })
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FieldMap {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
