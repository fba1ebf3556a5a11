//! Renderer contract and built-in renderers
//!
//! A renderer converts finished event data into the payload string a
//! handler writes. Renderers are pure with respect to the event data and,
//! like processors, may signal a drop instead of producing a payload
//! (built-ins drop events below their configured minimum level).
//!
//! Newline framing is the handler's job, not the renderer's: handlers with
//! line-oriented destinations append the trailing newline themselves.

use crate::error::RendererError;
use crate::event::EventData;
use crate::level::Level;

/// Outcome of rendering
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// The payload to write
    Payload(String),
    /// Drop the event for this handler
    Drop,
}

/// Convert event data to a formatted payload
pub trait Renderer: Send + Sync {
    /// Name used in error codes and diagnostics
    fn name(&self) -> &str;

    /// Render the event, or signal a drop
    fn render(&self, event: &EventData) -> Result<Rendered, RendererError>;
}

fn below_min(event: &EventData, min_level: Option<Level>) -> bool {
    match (min_level, event.level()) {
        (Some(min), Some(level)) => level < min,
        _ => false,
    }
}

// =============================================================================
// Built-in renderers
// =============================================================================

/// Emit just the `event` message
///
/// The smallest useful renderer; the default for sink-only test handlers.
#[derive(Debug, Clone, Default)]
pub struct MessageRenderer {
    min_level: Option<Level>,
}

impl MessageRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop events below this level instead of rendering them
    #[must_use]
    pub fn with_min_level(mut self, min_level: Level) -> Self {
        self.min_level = Some(min_level);
        self
    }
}

impl Renderer for MessageRenderer {
    fn name(&self) -> &str {
        "message"
    }

    fn render(&self, event: &EventData) -> Result<Rendered, RendererError> {
        if below_min(event, self.min_level) {
            return Ok(Rendered::Drop);
        }
        Ok(Rendered::Payload(event.event().unwrap_or_default().to_string()))
    }
}

/// Human-readable single-line output
///
/// ```text
/// 2026-08-02T10:30:45.123456Z [WARNING] app.db: slow query elapsed_ms=412
/// ```
///
/// Context entries follow the message as `key=value` pairs in key order.
#[derive(Debug, Clone, Default)]
pub struct PlainRenderer {
    min_level: Option<Level>,
}

impl PlainRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop events below this level instead of rendering them
    #[must_use]
    pub fn with_min_level(mut self, min_level: Level) -> Self {
        self.min_level = Some(min_level);
        self
    }
}

impl Renderer for PlainRenderer {
    fn name(&self) -> &str {
        "plain"
    }

    fn render(&self, event: &EventData) -> Result<Rendered, RendererError> {
        use std::fmt::Write;

        if below_min(event, self.min_level) {
            return Ok(Rendered::Drop);
        }

        let timestamp = event
            .get("timestamp")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("-");
        let level = event
            .get("level")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("INFO");
        let name = event.logger_name().unwrap_or("notset");
        let message = event.event().unwrap_or_default();

        let mut line = format!("{timestamp} [{level}] {name}: {message}");

        if let Some(context) = event.context() {
            for (key, value) in context {
                match value.as_str() {
                    Some(s) => {
                        let _ = write!(line, " {key}={s}");
                    }
                    None => {
                        let _ = write!(line, " {key}={value}");
                    }
                }
            }
        }

        Ok(Rendered::Payload(line))
    }
}

/// One JSON object per event
#[derive(Debug, Clone, Default)]
pub struct JsonRenderer {
    min_level: Option<Level>,
    pretty: bool,
}

impl JsonRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop events below this level instead of rendering them
    #[must_use]
    pub fn with_min_level(mut self, min_level: Level) -> Self {
        self.min_level = Some(min_level);
        self
    }

    /// Indented output (multi-line; not for line-counting consumers)
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, event: &EventData) -> Result<Rendered, RendererError> {
        if below_min(event, self.min_level) {
            return Ok(Rendered::Drop);
        }

        let result = if self.pretty {
            serde_json::to_string_pretty(event)
        } else {
            serde_json::to_string(event)
        };
        result
            .map(Rendered::Payload)
            .map_err(|e| RendererError::new(self.name(), e.to_string()))
    }
}

/// Closure adapter for ad-hoc renderers
pub struct RendererFn<F> {
    name: String,
    func: F,
}

impl<F> RendererFn<F>
where
    F: Fn(&EventData) -> Result<Rendered, RendererError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Renderer for RendererFn<F>
where
    F: Fn(&EventData) -> Result<Rendered, RendererError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, event: &EventData) -> Result<Rendered, RendererError> {
        (self.func)(event)
    }
}

#[cfg(test)]
#[path = "renderer_test.rs"]
mod renderer_test;
