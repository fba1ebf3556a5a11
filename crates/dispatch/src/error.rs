//! Dispatch error types
//!
//! Sync-path failures are collected per handler and surfaced to the caller
//! as one composite error whose context lists which handlers failed and
//! how. Async-path failures never reach the original caller; the worker
//! reports them on the fallback channel instead.

use thiserror::Error;

use kolog_core::{Category, ErrorCode, Layer};
use kolog_handlers::HandlerError;

/// One handler's failure inside a composite dispatch error
#[derive(Debug)]
pub struct HandlerFailure {
    /// Name of the failing handler
    pub handler: String,
    /// What went wrong
    pub error: HandlerError,
}

impl std::fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}`: {}", self.handler, self.error)
    }
}

/// Dispatch errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The queue is not accepting records (not started, or shutdown began)
    #[error("record queue is closed")]
    QueueClosed,

    /// No routing entry matched the record's logger name
    #[error("no handlers registered for logger `{logger}`")]
    NoHandlers { logger: String },

    /// One or more handlers failed on the sync path
    #[error(
        "{}/{attempted} handlers failed for logger `{logger}`: [{}]",
        .failures.len(),
        format_failures(.failures)
    )]
    Emit {
        logger: String,
        attempted: usize,
        failures: Vec<HandlerFailure>,
    },

    /// One or more handlers failed to close during shutdown
    #[error(
        "{} handlers failed to close during shutdown: [{}]",
        .failures.len(),
        format_failures(.failures)
    )]
    Shutdown { failures: Vec<HandlerFailure> },
}

fn format_failures(failures: &[HandlerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DispatchError {
    /// Structured code for the fallback channel and telemetry
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::QueueClosed | Self::NoHandlers { .. } | Self::Emit { .. } => {
                ErrorCode::new(Layer::Dispatch, "queue_manager", Category::Routing)
            }
            Self::Shutdown { .. } => ErrorCode::new(Layer::Dispatch, "queue_manager", Category::Io),
        }
    }
}

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;
