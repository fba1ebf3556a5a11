//! Bounded record queue with head eviction
//!
//! `tokio::sync::mpsc` covers the `block` and `drop` policies but cannot
//! evict its head, so `drop_oldest` forces a hand-rolled queue: a `VecDeque`
//! under a short-held lock, with `Notify`-based waiters for the blocking
//! producer path and the consumer.
//!
//! Once closed, pushes fail immediately while `pop` keeps draining the
//! remainder; this is what lets shutdown deliver everything enqueued before
//! the drain deadline.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use kolog_core::Record;

/// Push failure on the non-suspending paths
#[derive(Debug)]
pub(crate) enum TryPushError {
    /// The queue is at capacity; the record is handed back
    Full(Arc<Record>),
    /// The queue no longer accepts records
    Closed,
}

struct QueueInner {
    buf: VecDeque<Arc<Record>>,
    closed: bool,
}

/// FIFO queue bounded at `capacity`
pub(crate) struct RecordQueue {
    capacity: usize,
    inner: Mutex<QueueInner>,
    /// Notified once per pop; wakes a blocked producer
    space: Notify,
    /// Notified once per push; wakes the consumer
    ready: Notify,
    /// Notified whenever a pop empties the queue; wakes `wait_empty`
    drained: Notify,
}

impl RecordQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(QueueInner {
                buf: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
            }),
            space: Notify::new(),
            ready: Notify::new(),
            drained: Notify::new(),
        }
    }

    /// Push without suspending; fails when full or closed
    pub(crate) fn try_push(&self, record: Arc<Record>) -> Result<(), TryPushError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(TryPushError::Closed);
        }
        if inner.buf.len() >= self.capacity {
            return Err(TryPushError::Full(record));
        }
        inner.buf.push_back(record);
        drop(inner);
        self.ready.notify_one();
        Ok(())
    }

    /// Push, evicting the head when full; returns the evicted record
    pub(crate) fn push_evict(&self, record: Arc<Record>) -> Result<Option<Arc<Record>>, TryPushError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(TryPushError::Closed);
        }
        let evicted = if inner.buf.len() >= self.capacity {
            inner.buf.pop_front()
        } else {
            None
        };
        inner.buf.push_back(record);
        drop(inner);
        self.ready.notify_one();
        Ok(evicted)
    }

    /// Push, suspending until space is available or the queue closes
    pub(crate) async fn push_wait(&self, record: Arc<Record>) -> Result<(), TryPushError> {
        let mut record = record;
        loop {
            let notified = self.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_push(record) {
                Ok(()) => return Ok(()),
                Err(TryPushError::Closed) => return Err(TryPushError::Closed),
                Err(TryPushError::Full(back)) => record = back,
            }
            notified.await;
        }
    }

    /// Take the next record; `None` once the queue is closed and empty
    pub(crate) async fn pop(&self) -> Option<Arc<Record>> {
        loop {
            let notified = self.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut inner = self.inner.lock();
                if let Some(record) = inner.buf.pop_front() {
                    let now_empty = inner.buf.is_empty();
                    drop(inner);
                    self.space.notify_one();
                    if now_empty {
                        self.drained.notify_waiters();
                    }
                    return Some(record);
                }
                if inner.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Stop accepting pushes; queued records remain poppable
    pub(crate) fn close(&self) {
        self.inner.lock().closed = true;
        self.space.notify_waiters();
        self.ready.notify_waiters();
        self.drained.notify_waiters();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().buf.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.lock().buf.is_empty()
    }

    /// Suspend until the queue is empty
    ///
    /// A record popped but still mid-dispatch is not covered; callers that
    /// need full quiescence join the worker instead.
    pub(crate) async fn wait_empty(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.lock().buf.is_empty() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod queue_test;
