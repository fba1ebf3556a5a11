//! Handler contract
//!
//! A handler owns one destination resource and pairs it with its own
//! processors and renderer. Emission runs the same pipeline on both paths:
//!
//! 1. defensive copy of the record's event data
//! 2. processors in declared order (a drop signal halts, for this handler only)
//! 3. renderer (may also drop)
//! 4. newline framing for line-oriented destinations
//! 5. sink append, when a sink is attached
//! 6. the destination write
//!
//! The sync path holds the handler's sync write lock for the duration of
//! the write; the async path is additionally serialized by a cooperative
//! lock so a slow destination suspends the worker instead of blocking it.

use async_trait::async_trait;

use kolog_core::Record;

use crate::error::Result;
use crate::sink::Sink;

/// Destination owner with its own processor->renderer pipeline
///
/// Implementations must isolate failures: an error from one handler never
/// propagates into a sibling. The queue manager relies on that to keep a
/// bad destination from poisoning the worker.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handler name, used in error codes and diagnostics
    fn name(&self) -> &str;

    /// Run the pipeline and write on the caller's thread
    ///
    /// Returns `Ok(())` on success or on a pipeline drop signal; fails with
    /// a handler error on I/O or pipeline failure.
    fn emit_sync(&self, record: &Record) -> Result<()>;

    /// Run the pipeline and write on the cooperative path
    async fn emit_async(&self, record: &Record) -> Result<()>;

    /// Force buffered output to the destination; idempotent
    async fn flush(&self) -> Result<()>;

    /// Release the destination; safe to call twice, the second is a no-op
    ///
    /// After `close`, further emissions fail with a handler-closed error.
    async fn close(&self) -> Result<()>;

    /// Attach a capture sink; replaces any previously attached sink
    fn attach_sink(&self, sink: Sink);

    /// Detach the capture sink, restoring pre-attachment behavior
    fn detach_sink(&self);

    /// Number of events dropped by this handler's processors or renderer
    fn dropped(&self) -> u64;
}
