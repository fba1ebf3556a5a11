//! Ko-Log - Dispatch
//!
//! The bounded-queue dispatcher that connects loggers to handlers.
//!
//! # Architecture
//!
//! ```text
//! [callers]                [QueueManager]                  [Handlers]
//!   push_sync ───────────────────┬──────── emit_sync ──→ file / stream / ...
//!                                │
//!   enqueue ──→ bounded queue ──→ worker ── emit_async ─→ file / stream / ...
//!               (backpressure)      │
//!                                   └── errors → [ko-log:error] on stderr
//! ```
//!
//! # Key Design
//!
//! - **Backpressure is a queue-layer policy**: `block`, `drop` and
//!   `drop_oldest` are decided in one place, never inside handlers.
//! - **Single cooperative worker**: per-logger enqueue order is delivery
//!   order to each handler; scaling out would forfeit that.
//! - **Handler isolation**: failures are caught at the per-handler
//!   emission boundary on both paths. The sync path returns them as one
//!   composite error; the async path reports them on the fallback channel
//!   and keeps going.
//! - **Ordered shutdown**: drain within the deadline, cancel the worker,
//!   then close every handler, collecting close failures.

mod config;
mod error;
mod fallback;
mod manager;
mod queue;

pub use config::{BackpressurePolicy, QueueConfig};
pub use error::{DispatchError, HandlerFailure, Result};
pub use fallback::{FallbackCapture, FallbackChannel, FALLBACK_PREFIX};
pub use manager::{DropCounters, QueueManager, WorkerStatus};
