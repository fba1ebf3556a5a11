//! Sink - in-memory payload capture
//!
//! A sink observes the exact post-render payloads a handler writes,
//! including the trailing newline. Primarily a test instrument: attach one
//! to a handler, emit, and assert on `events()`.
//!
//! Sinks are cheap to clone; all clones share the same buffer. Appends are
//! serialized by the sink's own lock, so concurrent emissions from the sync
//! and async paths interleave whole payloads, never partial ones.

use std::sync::Arc;

use parking_lot::Mutex;

/// Append-only capture buffer for rendered payloads
#[derive(Debug, Clone, Default)]
pub struct Sink {
    events: Arc<Mutex<Vec<String>>>,
}

impl Sink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload
    pub fn push(&self, payload: impl Into<String>) {
        self.events.lock().push(payload.into());
    }

    /// Snapshot of captured payloads in append order
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Discard all captured payloads
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Number of captured payloads
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Check if nothing has been captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
