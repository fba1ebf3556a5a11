//! Null handler - discards all output
//!
//! The write step is a no-op, but the pipeline still runs: processors see
//! every event and an attached sink captures every payload. That makes the
//! null handler the default choice for tests and for benchmarking the
//! dispatch path without I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use kolog_core::{Processor, Record, Renderer};

use crate::error::{HandlerError, Result};
use crate::handler::Handler;
use crate::pipeline::EmitPipeline;
use crate::sink::Sink;

/// Handler that runs the pipeline and writes nowhere
pub struct NullHandler {
    pipeline: EmitPipeline,
    closed: AtomicBool,
}

impl NullHandler {
    /// Create a null handler with no processors
    #[must_use]
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self::with_processors(renderer, Vec::new())
    }

    /// Create a null handler with handler-level processors
    #[must_use]
    pub fn with_processors(renderer: Arc<dyn Renderer>, processors: Vec<Arc<dyn Processor>>) -> Self {
        Self {
            pipeline: EmitPipeline::new("null", renderer, processors, true),
            closed: AtomicBool::new(false),
        }
    }

    fn emit(&self, record: &Record) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HandlerError::Closed {
                handler: self.name().to_string(),
            });
        }
        // Pipeline runs for its side effects (processors, sink); the
        // payload itself is discarded.
        self.pipeline.run(record)?;
        Ok(())
    }
}

#[async_trait]
impl Handler for NullHandler {
    fn name(&self) -> &str {
        self.pipeline.handler_name()
    }

    fn emit_sync(&self, record: &Record) -> Result<()> {
        self.emit(record)
    }

    async fn emit_async(&self, record: &Record) -> Result<()> {
        self.emit(record)
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn attach_sink(&self, sink: Sink) {
        self.pipeline.attach_sink(sink);
    }

    fn detach_sink(&self) {
        self.pipeline.detach_sink();
    }

    fn dropped(&self) -> u64 {
        self.pipeline.dropped()
    }
}

#[cfg(test)]
#[path = "null_test.rs"]
mod null_test;
