//! The JSON preference record stored under one storage key.
//!
//! The record is shared with fields this crate does not own, so it is always
//! read whole, changed one field at a time, and written whole. Unknown fields
//! pass through untouched and keep their order.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::theme::Theme;

/// Storage key of the shared preference record.
pub const SESSION_KEY: &str = "userSessionInfo";
/// Field holding the theme name inside the record.
pub const THEME_FIELD: &str = "prefersColorScheme";

/// Error returned by [`SessionRecord::parse`].
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("stored record is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("stored record is JSON but not an object")]
    NotAnObject,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRecord {
    fields: Map<String, Value>,
}

impl SessionRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored record strictly.
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(RecordError::NotAnObject),
        }
    }

    /// Parse a stored record, treating absence or any failure as empty.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match Self::parse(raw) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("discarding unreadable preference record: {e}");
                Self::default()
            }
        }
    }

    /// The stored theme, if present and one of the known names.
    #[must_use]
    pub fn theme(&self) -> Option<Theme> {
        self.fields.get(THEME_FIELD).and_then(Value::as_str).and_then(Theme::from_name)
    }

    /// Overwrite only the theme field.
    pub fn set_theme(&mut self, theme: Theme) {
        self.merge_field(THEME_FIELD, Value::String(theme.as_str().to_owned()));
    }

    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.set_theme(theme);
        self
    }

    /// Insert or replace one field, leaving every other field as it was.
    pub fn merge_field(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialized form written back to storage.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }
}
