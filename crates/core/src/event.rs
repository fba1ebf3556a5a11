//! Event data - the mutable mapping processors transform
//!
//! An [`EventData`] is the string-keyed map a logger assembles for each log
//! call. Processors receive it by value, mutate or replace it, and hand it
//! on; once a [`Record`](crate::Record) is built the data is frozen.
//!
//! Required keys after logger-level assembly:
//!
//! | key         | content                                  |
//! |-------------|------------------------------------------|
//! | `event`     | the log message                          |
//! | `level`     | uppercase level name                     |
//! | `name`      | logger name (routing key)                |
//! | `timestamp` | RFC 3339 wall-clock time at creation     |
//! | `context`   | nested mapping of bound context          |
//!
//! Optional callsite keys (`filename`, `lineno`, `funcName`, `module`,
//! `pathname`) and a structured `exc_info` snapshot may also be present.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::level::Level;

/// String-keyed event mapping with arbitrary JSON values
///
/// Keys iterate in sorted order, which keeps rendered output deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventData {
    fields: BTreeMap<String, Value>,
}

impl EventData {
    /// Create an empty event mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble the required keys for a log call
    ///
    /// Sets `name`, `level`, `event`, a `timestamp` taken now, and an empty
    /// `context` mapping.
    #[must_use]
    pub fn for_log(name: impl Into<String>, level: Level, event: impl Into<String>) -> Self {
        let mut data = Self::new();
        data.insert("name", Value::String(name.into()));
        data.insert("level", Value::String(level.as_str().to_string()));
        data.insert("event", Value::String(event.into()));
        data.insert(
            "timestamp",
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        data.insert("context", Value::Object(serde_json::Map::new()));
        data
    }

    /// Insert or replace a field
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Insert a field only if absent
    pub fn insert_default(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Get a field by key
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a field, returning its value if present
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Check if a field is present
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the mapping is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in key order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// The `event` message, if present and a string
    #[inline]
    pub fn event(&self) -> Option<&str> {
        self.fields.get("event").and_then(Value::as_str)
    }

    /// The logger `name`, if present and a string
    #[inline]
    pub fn logger_name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// The parsed `level`, if present and a known level name
    pub fn level(&self) -> Option<Level> {
        self.fields
            .get("level")
            .and_then(Value::as_str)
            .and_then(|s| Level::from_str(s).ok())
    }

    /// The parsed `timestamp`, if present and valid RFC 3339
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.fields
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    /// The nested `context` mapping, if present and an object
    #[inline]
    pub fn context(&self) -> Option<&serde_json::Map<String, Value>> {
        self.fields.get("context").and_then(Value::as_object)
    }

    /// Mutable access to the `context` mapping, creating it if absent
    pub fn context_mut(&mut self) -> &mut serde_json::Map<String, Value> {
        let entry = self
            .fields
            .entry("context".to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(serde_json::Map::new());
        }
        entry.as_object_mut().expect("context is an object")
    }
}

impl FromIterator<(String, Value)> for EventData {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_log_required_keys() {
        let data = EventData::for_log("app", Level::Info, "started");

        assert_eq!(data.logger_name(), Some("app"));
        assert_eq!(data.level(), Some(Level::Info));
        assert_eq!(data.event(), Some("started"));
        assert!(data.timestamp().is_some());
        assert!(data.context().is_some());
    }

    #[test]
    fn test_insert_default_keeps_existing() {
        let mut data = EventData::new();
        data.insert("service", "api");
        data.insert_default("service", "other");
        data.insert_default("region", "eu");

        assert_eq!(data.get("service"), Some(&Value::from("api")));
        assert_eq!(data.get("region"), Some(&Value::from("eu")));
    }

    #[test]
    fn test_context_mut_creates_mapping() {
        let mut data = EventData::new();
        data.context_mut()
            .insert("request_id".into(), Value::from("abc"));

        assert_eq!(
            data.context().unwrap().get("request_id"),
            Some(&Value::from("abc"))
        );
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let mut data = EventData::new();
        data.insert("b", 2);
        data.insert("a", 1);
        data.insert("c", 3);

        let keys: Vec<&str> = data.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
