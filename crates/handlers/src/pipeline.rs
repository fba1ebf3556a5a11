//! Shared per-handler emission pipeline
//!
//! Both emission paths of every handler variant run the same sequence, so
//! the pipeline lives in one place and the variants only differ in how the
//! final payload reaches the destination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use kolog_core::{Processed, Processor, Record, Rendered, Renderer};

use crate::error::{HandlerError, Result};
use crate::sink::Sink;

/// Processors, renderer, sink slot and drop counter for one handler
pub(crate) struct EmitPipeline {
    handler_name: String,
    processors: Vec<Arc<dyn Processor>>,
    renderer: Arc<dyn Renderer>,
    line_oriented: bool,
    sink: Mutex<Option<Sink>>,
    drops: AtomicU64,
}

impl EmitPipeline {
    pub(crate) fn new(
        handler_name: impl Into<String>,
        renderer: Arc<dyn Renderer>,
        processors: Vec<Arc<dyn Processor>>,
        line_oriented: bool,
    ) -> Self {
        Self {
            handler_name: handler_name.into(),
            processors,
            renderer,
            line_oriented,
            sink: Mutex::new(None),
            drops: AtomicU64::new(0),
        }
    }

    pub(crate) fn handler_name(&self) -> &str {
        &self.handler_name
    }

    pub(crate) fn attach_sink(&self, sink: Sink) {
        *self.sink.lock() = Some(sink);
    }

    pub(crate) fn detach_sink(&self) {
        *self.sink.lock() = None;
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }

    /// Run processors and renderer over a defensive copy of the event data
    ///
    /// Returns `Ok(None)` on a drop signal (counted, not an error). The
    /// returned payload has newline framing applied and has already been
    /// appended to the attached sink, so callers only perform the write.
    pub(crate) fn run(&self, record: &Record) -> Result<Option<String>> {
        let mut event = record.event_data().clone();

        for processor in &self.processors {
            match processor.process(event).map_err(|source| HandlerError::Processor {
                handler: self.handler_name.clone(),
                source,
            })? {
                Processed::Event(next) => event = next,
                Processed::Drop => {
                    self.drops.fetch_add(1, Ordering::Relaxed);
                    return Ok(None);
                }
            }
        }

        let payload = match self.renderer.render(&event).map_err(|source| {
            HandlerError::Renderer {
                handler: self.handler_name.clone(),
                source,
            }
        })? {
            Rendered::Payload(payload) => payload,
            Rendered::Drop => {
                self.drops.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
        };

        let payload = if self.line_oriented && !payload.ends_with('\n') {
            let mut framed = payload;
            framed.push('\n');
            framed
        } else {
            payload
        };

        // Snapshot under the slot lock so attach/detach is atomic with
        // respect to emissions, then append outside it.
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink {
            sink.push(payload.clone());
        }

        Ok(Some(payload))
    }
}
