//! Processor contract and built-in processors
//!
//! A processor is a pure transform over [`EventData`]. It may mutate the
//! data it receives and return it, or build a new value; callers treat the
//! returned value as authoritative. Dropping an event is a distinguished
//! control outcome ([`Processed::Drop`]), never an error - a drop halts the
//! pipeline for the owning handler only and is counted, not reported.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ProcessorError;
use crate::event::EventData;
use crate::level::Level;

/// Outcome of a processor stage
#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
    /// Continue the pipeline with this event data
    Event(EventData),
    /// Drop the event for this handler; siblings are unaffected
    Drop,
}

/// Pure transform of event data
///
/// Must be total on well-formed input. Unexpected failures surface as a
/// [`ProcessorError`], which isolates to the handler running the pipeline.
pub trait Processor: Send + Sync {
    /// Name used in error codes and diagnostics
    fn name(&self) -> &str;

    /// Transform the event, or signal a drop
    fn process(&self, event: EventData) -> Result<Processed, ProcessorError>;
}

// =============================================================================
// Built-in processors
// =============================================================================

/// Drop events below a minimum level
///
/// Events without a parseable `level` key pass through untouched.
#[derive(Debug, Clone)]
pub struct FilterByLevel {
    min_level: Level,
}

impl FilterByLevel {
    #[must_use]
    pub fn new(min_level: Level) -> Self {
        Self { min_level }
    }
}

impl Processor for FilterByLevel {
    fn name(&self) -> &str {
        "filter_by_level"
    }

    fn process(&self, event: EventData) -> Result<Processed, ProcessorError> {
        let level = match event.get("level").and_then(Value::as_str) {
            Some(raw) => match Level::from_str(raw) {
                Ok(level) => Some(level),
                Err(err) => return Err(ProcessorError::new(self.name(), err.to_string())),
            },
            None => None,
        };
        match level {
            Some(level) if level < self.min_level => Ok(Processed::Drop),
            _ => Ok(Processed::Event(event)),
        }
    }
}

/// Add default context fields to every event
///
/// Existing keys win; defaults only fill gaps.
#[derive(Debug, Clone, Default)]
pub struct AddContextDefaults {
    defaults: BTreeMap<String, Value>,
}

impl AddContextDefaults {
    #[must_use]
    pub fn new(defaults: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            defaults: defaults.into_iter().collect(),
        }
    }
}

impl Processor for AddContextDefaults {
    fn name(&self) -> &str {
        "add_context_defaults"
    }

    fn process(&self, mut event: EventData) -> Result<Processed, ProcessorError> {
        for (key, value) in &self.defaults {
            event.insert_default(key.clone(), value.clone());
        }
        Ok(Processed::Event(event))
    }
}

/// Remove specific keys from event data
///
/// Useful for excluding sensitive fields before rendering.
#[derive(Debug, Clone, Default)]
pub struct FilterKeys {
    keys: Vec<String>,
}

impl FilterKeys {
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Processor for FilterKeys {
    fn name(&self) -> &str {
        "filter_keys"
    }

    fn process(&self, mut event: EventData) -> Result<Processed, ProcessorError> {
        for key in &self.keys {
            event.remove(key);
        }
        Ok(Processed::Event(event))
    }
}

/// Closure adapter for ad-hoc processors
pub struct ProcessorFn<F> {
    name: String,
    func: F,
}

impl<F> ProcessorFn<F>
where
    F: Fn(EventData) -> Result<Processed, ProcessorError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Processor for ProcessorFn<F>
where
    F: Fn(EventData) -> Result<Processed, ProcessorError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, event: EventData) -> Result<Processed, ProcessorError> {
        (self.func)(event)
    }
}

#[cfg(test)]
#[path = "processor_test.rs"]
mod processor_test;
