//! Stream handler - writes to standard output or standard error
//!
//! The sync path uses the locked native stream writer. The async path goes
//! through tokio's stdout/stderr wrappers; on platforms without true async
//! console I/O these degrade to pool-backed blocking writes, so tests must
//! not depend on non-blocking behavior of the stream.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;

use kolog_core::{Processor, Record, Renderer};

use crate::error::{HandlerError, Result};
use crate::handler::Handler;
use crate::pipeline::EmitPipeline;
use crate::sink::Sink;

/// Handler for the process's standard streams
pub struct StreamHandler {
    pipeline: EmitPipeline,
    use_stderr: bool,
    sync_lock: Mutex<()>,
    async_lock: AsyncMutex<()>,
    closed: AtomicBool,
}

impl StreamHandler {
    /// Create a stream handler; `use_stderr` selects the destination
    #[must_use]
    pub fn new(renderer: Arc<dyn Renderer>, use_stderr: bool) -> Self {
        Self::with_processors(renderer, Vec::new(), use_stderr)
    }

    /// Create a stream handler with handler-level processors
    #[must_use]
    pub fn with_processors(
        renderer: Arc<dyn Renderer>,
        processors: Vec<Arc<dyn Processor>>,
        use_stderr: bool,
    ) -> Self {
        let name = if use_stderr { "stderr" } else { "stdout" };
        Self {
            pipeline: EmitPipeline::new(name, renderer, processors, true),
            use_stderr,
            sync_lock: Mutex::new(()),
            async_lock: AsyncMutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HandlerError::Closed {
                handler: self.name().to_string(),
            });
        }
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> HandlerError {
        HandlerError::Write {
            handler: self.name().to_string(),
            source,
        }
    }

    fn write_sync(&self, payload: &str) -> Result<()> {
        let _guard = self.sync_lock.lock();
        let result = if self.use_stderr {
            let mut stream = std::io::stderr().lock();
            stream.write_all(payload.as_bytes()).and_then(|()| stream.flush())
        } else {
            let mut stream = std::io::stdout().lock();
            stream.write_all(payload.as_bytes()).and_then(|()| stream.flush())
        };
        result.map_err(|e| self.write_error(e))
    }

    async fn write_async(&self, payload: &str) -> Result<()> {
        let _guard = self.async_lock.lock().await;
        let result = if self.use_stderr {
            let mut stream = tokio::io::stderr();
            match stream.write_all(payload.as_bytes()).await {
                Ok(()) => stream.flush().await,
                Err(e) => Err(e),
            }
        } else {
            let mut stream = tokio::io::stdout();
            match stream.write_all(payload.as_bytes()).await {
                Ok(()) => stream.flush().await,
                Err(e) => Err(e),
            }
        };
        result.map_err(|e| self.write_error(e))
    }
}

#[async_trait]
impl Handler for StreamHandler {
    fn name(&self) -> &str {
        self.pipeline.handler_name()
    }

    fn emit_sync(&self, record: &Record) -> Result<()> {
        self.check_open()?;
        match self.pipeline.run(record)? {
            Some(payload) => self.write_sync(&payload),
            None => Ok(()),
        }
    }

    async fn emit_async(&self, record: &Record) -> Result<()> {
        self.check_open()?;
        match self.pipeline.run(record)? {
            Some(payload) => self.write_async(&payload).await,
            None => Ok(()),
        }
    }

    async fn flush(&self) -> Result<()> {
        // Every write flushes, so there is nothing buffered to force out.
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // The process owns its standard streams; closing the handler only
        // stops further emissions.
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
