//! Queue manager - routing, backpressure and the dispatch worker
//!
//! The manager owns the bounded record queue, the routing table and a
//! single cooperative worker task. Producers have two entry points:
//!
//! - [`QueueManager::push_sync`] runs every target handler on the caller's
//!   thread and returns a composite error listing per-handler outcomes;
//! - [`QueueManager::enqueue`] applies the configured backpressure policy
//!   and hands the record to the worker.
//!
//! Routing resolves the logger name exactly, then walks the dotted
//! hierarchy (`app.db.pool` -> `app.db` -> `app`), then falls back to the
//! `"root"` entry. The worker snapshots the handler list per record, so
//! `register` takes effect immediately without blocking dispatch.
//!
//! Handler failures inside the worker go to the fallback error channel and
//! never stop the worker or sibling handlers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use kolog_core::{ConfigurationError, Record};
use kolog_handlers::{Handler, Sink};

use crate::config::{BackpressurePolicy, QueueConfig};
use crate::error::{DispatchError, HandlerFailure, Result};
use crate::fallback::FallbackChannel;
use crate::queue::{RecordQueue, TryPushError};

/// Worker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Not started, or shut down
    Stopped,
    /// Consuming the queue
    Running,
    /// Shutdown began; draining the remainder
    Draining,
}

/// Why a record was dropped, per logger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounters {
    /// `drop` policy rejected the record at a full queue
    pub queue_full: u64,
    /// `drop_oldest` policy evicted the record from the head
    pub evicted: u64,
    /// No routing entry matched on the async path
    pub no_route: u64,
}

impl DropCounters {
    /// Sum across all reasons
    #[must_use]
    pub fn total(&self) -> u64 {
        self.queue_full + self.evicted + self.no_route
    }
}

enum DropReason {
    QueueFull,
    Evicted,
    NoRoute,
}

struct ManagerInner {
    config: QueueConfig,
    queue: RecordQueue,
    routes: RwLock<HashMap<String, Vec<Arc<dyn Handler>>>>,
    sinks: Mutex<HashMap<String, Sink>>,
    drops: Mutex<HashMap<String, DropCounters>>,
    status: Mutex<WorkerStatus>,
    pause: watch::Sender<bool>,
    fallback: FallbackChannel,
}

impl ManagerInner {
    /// Snapshot the handlers for a logger: exact match, then nearest dotted
    /// ancestor, then `"root"`
    fn resolve(&self, logger_name: &str) -> Vec<Arc<dyn Handler>> {
        let routes = self.routes.read();
        if let Some(handlers) = routes.get(logger_name) {
            return handlers.clone();
        }
        let mut name = logger_name;
        while let Some(split) = name.rfind('.') {
            name = &name[..split];
            if let Some(handlers) = routes.get(name) {
                return handlers.clone();
            }
        }
        routes.get("root").cloned().unwrap_or_default()
    }

    fn record_drop(&self, logger_name: &str, reason: DropReason) {
        let mut drops = self.drops.lock();
        let counters = drops.entry(logger_name.to_string()).or_default();
        match reason {
            DropReason::QueueFull => counters.queue_full += 1,
            DropReason::Evicted => counters.evicted += 1,
            DropReason::NoRoute => counters.no_route += 1,
        }
    }

    /// Fan one record out to its handlers, isolating each failure
    async fn dispatch(&self, record: &Record) {
        let handlers = self.resolve(record.logger_name());
        if handlers.is_empty() {
            tracing::warn!(
                logger = record.logger_name(),
                "no handlers registered, dropping record"
            );
            self.record_drop(record.logger_name(), DropReason::NoRoute);
            return;
        }

        for handler in handlers {
            if let Err(error) = handler.emit_async(record).await {
                self.fallback.report(&error.code(), &error);
                tracing::warn!(
                    handler = handler.name(),
                    logger = record.logger_name(),
                    error = %error,
                    "handler emission failed"
                );
            }
        }
    }
}

async fn worker_loop(inner: Arc<ManagerInner>) {
    let mut paused = inner.pause.subscribe();
    tracing::debug!("dispatch worker started");

    loop {
        // Test hook: hold before the next pop while paused.
        while *paused.borrow_and_update() {
            if paused.changed().await.is_err() {
                return;
            }
        }

        tokio::select! {
            record = inner.queue.pop() => match record {
                Some(record) => inner.dispatch(&record).await,
                None => break,
            },
            changed = paused.changed() => {
                if changed.is_err() {
                    break;
                }
                // Loop back to re-evaluate the pause gate before popping.
            }
        }
    }

    tracing::debug!("dispatch worker drained and stopped");
}

/// Bounded-queue dispatcher with sync and async emission paths
///
/// # Example
///
/// ```ignore
/// let manager = QueueManager::new(QueueConfig::default())?;
/// manager.register("app", vec![handler]);
/// manager.start();
///
/// manager.enqueue(record).await?;
/// manager.shutdown().await?;
/// ```
pub struct QueueManager {
    inner: Arc<ManagerInner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl QueueManager {
    /// Create a manager reporting async-path errors to standard error
    pub fn new(config: QueueConfig) -> std::result::Result<Self, ConfigurationError> {
        Self::with_fallback(config, FallbackChannel::stderr())
    }

    /// Create a manager with an explicit fallback error channel
    pub fn with_fallback(
        config: QueueConfig,
        fallback: FallbackChannel,
    ) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        let (pause, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(ManagerInner {
                queue: RecordQueue::new(config.max_queue_size),
                config,
                routes: RwLock::new(HashMap::new()),
                sinks: Mutex::new(HashMap::new()),
                drops: Mutex::new(HashMap::new()),
                status: Mutex::new(WorkerStatus::Stopped),
                pause,
                fallback,
            }),
            worker: Mutex::new(None),
        })
    }

    // -------------------------------------------------------------------------
    // Routing and sinks
    // -------------------------------------------------------------------------

    /// Install or replace the routing entry for a logger
    ///
    /// Takes effect immediately for new emissions. A sink registered for
    /// this logger is attached to the incoming handlers.
    pub fn register(&self, logger_name: impl Into<String>, handlers: Vec<Arc<dyn Handler>>) {
        let logger_name = logger_name.into();
        if let Some(sink) = self.inner.sinks.lock().get(&logger_name) {
            for handler in &handlers {
                handler.attach_sink(sink.clone());
            }
        }
        tracing::debug!(
            logger = logger_name.as_str(),
            handlers = handlers.len(),
            "registered routing entry"
        );
        self.inner.routes.write().insert(logger_name, handlers);
    }

    /// Attach a sink to every handler routed by this logger
    ///
    /// Idempotent; the sink stays attached for the duration of the
    /// registration, including to handlers registered later.
    pub fn add_sink(&self, logger_name: impl Into<String>, sink: Sink) {
        let logger_name = logger_name.into();
        if let Some(handlers) = self.inner.routes.read().get(&logger_name) {
            for handler in handlers {
                handler.attach_sink(sink.clone());
            }
        }
        self.inner.sinks.lock().insert(logger_name, sink);
    }

    /// Detach the sink registered for this logger, restoring the handlers'
    /// pre-attachment state
    pub fn remove_sink(&self, logger_name: &str) {
        if self.inner.sinks.lock().remove(logger_name).is_some() {
            if let Some(handlers) = self.inner.routes.read().get(logger_name) {
                for handler in handlers {
                    handler.detach_sink();
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Emission paths
    // -------------------------------------------------------------------------

    /// Emit on the caller's thread, bypassing the queue
    ///
    /// Every resolved handler runs to completion or failure; failures are
    /// collected per handler and returned as one composite dispatch error.
    /// Independent of the worker: works before `start` and during drain.
    pub fn push_sync(&self, record: &Record) -> Result<()> {
        let handlers = self.inner.resolve(record.logger_name());
        if handlers.is_empty() {
            return Err(DispatchError::NoHandlers {
                logger: record.logger_name().to_string(),
            });
        }

        let attempted = handlers.len();
        let mut failures = Vec::new();
        for handler in handlers {
            if let Err(error) = handler.emit_sync(record) {
                failures.push(HandlerFailure {
                    handler: handler.name().to_string(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::Emit {
                logger: record.logger_name().to_string(),
                attempted,
                failures,
            })
        }
    }

    /// Enqueue for the worker, applying the backpressure policy
    ///
    /// - `block`: suspends until space is available or shutdown begins
    /// - `drop`: a full queue drops the record, counts it, and returns `Ok`
    /// - `drop_oldest`: a full queue evicts the head and counts it
    ///
    /// Fails with a queue-closed dispatch error unless the worker is
    /// running.
    pub async fn enqueue(&self, record: Record) -> Result<()> {
        if *self.inner.status.lock() != WorkerStatus::Running {
            return Err(DispatchError::QueueClosed);
        }

        let record = Arc::new(record);
        match self.inner.config.backpressure_policy {
            BackpressurePolicy::Block => self
                .inner
                .queue
                .push_wait(record)
                .await
                .map_err(|_| DispatchError::QueueClosed),
            BackpressurePolicy::Drop => match self.inner.queue.try_push(record) {
                Ok(()) => Ok(()),
                Err(TryPushError::Full(rejected)) => {
                    self.inner
                        .record_drop(rejected.logger_name(), DropReason::QueueFull);
                    Ok(())
                }
                Err(TryPushError::Closed) => Err(DispatchError::QueueClosed),
            },
            BackpressurePolicy::DropOldest => match self.inner.queue.push_evict(record) {
                Ok(Some(evicted)) => {
                    self.inner
                        .record_drop(evicted.logger_name(), DropReason::Evicted);
                    Ok(())
                }
                Ok(None) => Ok(()),
                Err(_) => Err(DispatchError::QueueClosed),
            },
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Launch the background worker
    ///
    /// Idempotent; only the first call has effect. Must be called from
    /// within a tokio runtime. A manager that has been shut down does not
    /// restart.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return;
        }
        {
            let mut status = self.inner.status.lock();
            if *status != WorkerStatus::Stopped || self.inner.queue.is_closed() {
                return;
            }
            *status = WorkerStatus::Running;
        }
        *worker = Some(tokio::spawn(worker_loop(Arc::clone(&self.inner))));
    }

    /// Suspend until every queued record has been handed to the worker
    pub async fn flush(&self) {
        self.inner.queue.wait_empty().await;
    }

    /// Drain, cancel, close
    ///
    /// Stops accepting enqueues, lets the worker consume the remainder of
    /// the queue until the drain deadline, cancels the worker if the
    /// deadline fires, then closes every registered handler. Per-handler
    /// close failures are collected into a composite shutdown error but do
    /// not prevent other handlers from being closed.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut status = self.inner.status.lock();
            if *status == WorkerStatus::Stopped && self.inner.queue.is_closed() {
                return Ok(());
            }
            *status = WorkerStatus::Draining;
        }

        self.inner.queue.close();
        // A paused worker cannot drain; release the gate.
        self.inner.pause.send_replace(false);

        let handle = self.worker.lock().take();
        if let Some(mut handle) = handle {
            let drain = self.inner.config.drain_timeout();
            if tokio::time::timeout(drain, &mut handle).await.is_err() {
                tracing::warn!(
                    timeout_secs = drain.as_secs_f64(),
                    remaining = self.inner.queue.len(),
                    "drain deadline elapsed, cancelling worker"
                );
                handle.abort();
                let _ = handle.await;
            }
        }

        let handlers = self.unique_handlers();
        let mut failures = Vec::new();
        for handler in handlers {
            if let Err(error) = handler.close().await {
                failures.push(HandlerFailure {
                    handler: handler.name().to_string(),
                    error,
                });
            }
        }

        *self.inner.status.lock() = WorkerStatus::Stopped;
        tracing::debug!(close_failures = failures.len(), "queue manager stopped");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::Shutdown { failures })
        }
    }

    /// Registered handlers, deduplicated across routing entries
    fn unique_handlers(&self) -> Vec<Arc<dyn Handler>> {
        let routes = self.inner.routes.read();
        let mut unique: Vec<Arc<dyn Handler>> = Vec::new();
        for handlers in routes.values() {
            for handler in handlers {
                if !unique.iter().any(|seen| Arc::ptr_eq(seen, handler)) {
                    unique.push(Arc::clone(handler));
                }
            }
        }
        unique
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// Current worker status
    pub fn status(&self) -> WorkerStatus {
        *self.inner.status.lock()
    }

    /// Whether the worker is accepting enqueues
    pub fn is_running(&self) -> bool {
        self.status() == WorkerStatus::Running
    }

    /// Records currently waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// Drop counters for a logger
    pub fn dropped(&self, logger_name: &str) -> DropCounters {
        self.inner
            .drops
            .lock()
            .get(logger_name)
            .copied()
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Test instrumentation
    // -------------------------------------------------------------------------

    /// Test hook: hold the worker before its next pop
    ///
    /// Enqueues still succeed while paused, which is how backpressure
    /// behavior is exercised deterministically.
    pub fn pause_worker(&self) {
        self.inner.pause.send_replace(true);
    }

    /// Test hook: release a paused worker
    pub fn resume_worker(&self) {
        self.inner.pause.send_replace(false);
    }
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("status", &self.status())
            .field("queue_len", &self.inner.queue.len())
            .field("routes", &self.inner.routes.read().len())
            .finish()
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
