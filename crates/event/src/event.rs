//! The event type
//!
//! An event is a JSON-like tree rooted at a string-keyed mapping, with an
//! implicit `tags` array used for conditional routing and failure marking.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path;

/// Field holding the event's routing tags (array of strings).
pub const TAGS_FIELD: &str = "tags";

/// Field holding the event's timestamp, read by temporal conditions.
pub const TIMESTAMP_FIELD: &str = "@timestamp";

/// One record flowing through the pipeline.
///
/// Handoff between processors is a move; a processor must not hold a
/// reference to an event it has passed downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    fields: Map<String, Value>,
}

impl Event {
    /// Create an empty event.
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the event has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by dotted path (`a.b.0.c`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        path::get(&self.fields, path)
    }

    /// Look up a field and view it as a string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Write a field by dotted path, creating missing intermediate objects.
    ///
    /// Returns `false` when the path is blocked by a non-mapping value or an
    /// out-of-range array index; the event is left unchanged in that case.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> bool {
        path::set(&mut self.fields, path, value.into())
    }

    /// Remove and return the field at a dotted path.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        path::remove(&mut self.fields, path)
    }

    /// Append a tag unless it is already present.
    ///
    /// A missing or non-array `tags` field is replaced by a fresh array.
    pub fn add_tag(&mut self, tag: &str) {
        match self.fields.get_mut(TAGS_FIELD) {
            Some(Value::Array(tags)) => {
                if !tags.iter().any(|t| t.as_str() == Some(tag)) {
                    tags.push(Value::String(tag.to_string()));
                }
            }
            _ => {
                self.fields.insert(
                    TAGS_FIELD.to_string(),
                    Value::Array(vec![Value::String(tag.to_string())]),
                );
            }
        }
    }

    /// Remove every occurrence of a tag; drops the `tags` field when the
    /// array empties.
    pub fn remove_tag(&mut self, tag: &str) {
        if let Some(Value::Array(tags)) = self.fields.get_mut(TAGS_FIELD) {
            tags.retain(|t| t.as_str() != Some(tag));
            if tags.is_empty() {
                self.fields.remove(TAGS_FIELD);
            }
        }
    }

    /// Whether the event carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        match self.fields.get(TAGS_FIELD) {
            Some(Value::Array(tags)) => tags.iter().any(|t| t.as_str() == Some(tag)),
            _ => false,
        }
    }

    /// Read the event timestamp from [`TIMESTAMP_FIELD`].
    ///
    /// Accepts RFC 3339 strings and epoch numbers (seconds, or milliseconds
    /// when the magnitude says so).
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self.fields.get(TIMESTAMP_FIELD)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => {
                let epoch = n.as_i64()?;
                if epoch.abs() >= 1_000_000_000_000 {
                    Utc.timestamp_millis_opt(epoch).single()
                } else {
                    Utc.timestamp_opt(epoch, 0).single()
                }
            }
            _ => None,
        }
    }

    /// Render the event as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> String {
        // A string-keyed map of JSON values cannot fail to serialize.
        serde_json::to_string(&self.fields).unwrap_or_default()
    }

    /// Borrow the underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for Event {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
