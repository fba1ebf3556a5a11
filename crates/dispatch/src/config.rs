//! Queue manager configuration
//!
//! The validated configuration tree is produced elsewhere; this crate only
//! consumes the already-deserialized values. Backpressure is a first-class
//! policy decided here, in the queue layer, never inside handlers.

use std::time::Duration;

use serde::Deserialize;

use kolog_core::ConfigurationError;

/// Behavior when the bounded queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Suspend the producer until space is available
    Block,
    /// Drop the new record and count it
    Drop,
    /// Evict the oldest queued record, count it, and push the new one (default)
    #[default]
    DropOldest,
}

/// Queue manager configuration
///
/// # Example
///
/// ```toml
/// [queue]
/// max_queue_size = 10000
/// backpressure_policy = "drop_oldest"
/// drain_timeout_secs = 5.0
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Bounded queue capacity
    /// Default: 10000
    pub max_queue_size: usize,

    /// Behavior when the queue is full
    /// Default: drop_oldest
    pub backpressure_policy: BackpressurePolicy,

    /// How long shutdown waits for the worker to drain the queue
    /// Default: 5.0
    pub drain_timeout_secs: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10_000,
            backpressure_policy: BackpressurePolicy::default(),
            drain_timeout_secs: 5.0,
        }
    }
}

impl QueueConfig {
    /// Set the queue capacity
    #[must_use]
    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Set the backpressure policy
    #[must_use]
    pub fn with_policy(mut self, policy: BackpressurePolicy) -> Self {
        self.backpressure_policy = policy;
        self
    }

    /// Set the drain timeout
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout_secs = timeout.as_secs_f64();
        self
    }

    /// Drain timeout as a [`Duration`]
    #[must_use]
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.drain_timeout_secs.max(0.0))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_queue_size == 0 {
            return Err(ConfigurationError::new(
                "queue",
                "max_queue_size must be a positive integer",
            ));
        }
        if !self.drain_timeout_secs.is_finite() || self.drain_timeout_secs < 0.0 {
            return Err(ConfigurationError::new(
                "queue",
                format!("drain_timeout_secs must be non-negative, got {}", self.drain_timeout_secs),
            ));
        }
        Ok(())
    }
}
