//! Log record - the immutable dispatch envelope
//!
//! A [`Record`] is built once per log call from the assembled event data and
//! never mutated afterwards. The routing key is the logger name; the level
//! is already resolved (logger-level filtering happens before a record is
//! constructed). Records carry no references to mutable caller state - the
//! event data is owned.

use chrono::{DateTime, Utc};

use crate::event::EventData;
use crate::level::Level;

/// Immutable record dispatched through the queue
///
/// Fields are private; the record is read-only once constructed. Dispatch
/// wraps records in `Arc` so multi-handler fan-out never copies the data.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    logger_name: String,
    level: Level,
    timestamp: DateTime<Utc>,
    event_data: EventData,
}

impl Record {
    /// Build a record from assembled event data
    ///
    /// Missing or malformed routing keys fall back to safe defaults: the
    /// logger name defaults to `"notset"`, the level to `Info`, and the
    /// timestamp to now. A well-behaved logger always supplies all three.
    #[must_use]
    pub fn from_event(event_data: EventData) -> Self {
        let logger_name = event_data.logger_name().unwrap_or("notset").to_string();
        let level = event_data.level().unwrap_or_default();
        let timestamp = event_data.timestamp().unwrap_or_else(Utc::now);

        Self {
            logger_name,
            level,
            timestamp,
            event_data,
        }
    }

    /// Logger name used for handler routing
    #[inline]
    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// Resolved dispatch level
    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Wall-clock time at creation
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The frozen event data
    #[inline]
    pub fn event_data(&self) -> &EventData {
        &self.event_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_event_carries_routing_keys() {
        let data = EventData::for_log("app.db", Level::Warning, "slow query");
        let record = Record::from_event(data);

        assert_eq!(record.logger_name(), "app.db");
        assert_eq!(record.level(), Level::Warning);
        assert_eq!(record.event_data().event(), Some("slow query"));
    }

    #[test]
    fn test_from_event_defaults() {
        let record = Record::from_event(EventData::new());

        assert_eq!(record.logger_name(), "notset");
        assert_eq!(record.level(), Level::Info);
    }
}
