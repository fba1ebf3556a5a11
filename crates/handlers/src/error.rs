//! Handler error types
//!
//! Every destination operation (open, write, rotate, flush, close) maps to
//! its own variant so the structured code and the recoverable flag can be
//! derived from what actually failed. Processor and renderer failures that
//! occur inside a handler's pipeline are wrapped here too - they isolate to
//! the one handler running the pipeline.

use std::path::PathBuf;

use thiserror::Error;

use kolog_core::{Category, ErrorCode, Layer, ProcessorError, RendererError};

/// Handler errors
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Opening the destination failed
    #[error("handler `{handler}` failed to open `{path}`")]
    Open {
        handler: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to the destination failed
    #[error("handler `{handler}` failed to write")]
    Write {
        handler: String,
        #[source]
        source: std::io::Error,
    },

    /// File rotation failed; the previous destination was restored
    #[error("handler `{handler}` failed to rotate `{path}`")]
    Rotate {
        handler: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Flushing buffered output failed
    #[error("handler `{handler}` failed to flush")]
    Flush {
        handler: String,
        #[source]
        source: std::io::Error,
    },

    /// Releasing the destination failed
    #[error("handler `{handler}` failed to close")]
    Close {
        handler: String,
        #[source]
        source: std::io::Error,
    },

    /// Emission was attempted after `close`
    #[error("handler `{handler}` is closed")]
    Closed { handler: String },

    /// The handler has no synchronous write path
    #[error("handler `{handler}` does not support synchronous emission")]
    SyncUnsupported { handler: String },

    /// A pipeline processor failed inside this handler
    #[error("handler `{handler}` pipeline failed")]
    Processor {
        handler: String,
        #[source]
        source: ProcessorError,
    },

    /// The renderer failed inside this handler
    #[error("handler `{handler}` pipeline failed")]
    Renderer {
        handler: String,
        #[source]
        source: RendererError,
    },
}

impl HandlerError {
    /// Name of the handler the error is scoped to
    pub fn handler(&self) -> &str {
        match self {
            Self::Open { handler, .. }
            | Self::Write { handler, .. }
            | Self::Rotate { handler, .. }
            | Self::Flush { handler, .. }
            | Self::Close { handler, .. }
            | Self::Closed { handler }
            | Self::SyncUnsupported { handler }
            | Self::Processor { handler, .. }
            | Self::Renderer { handler, .. } => handler,
        }
    }

    /// Whether retrying the failed operation can reasonably succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::Flush { .. })
    }

    /// Structured code for the fallback channel and telemetry
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Open { handler, .. }
            | Self::Rotate { handler, .. }
            | Self::Close { handler, .. }
            | Self::Closed { handler } => {
                ErrorCode::new(Layer::Handler, handler.clone(), Category::Io)
            }
            Self::Write { handler, .. } | Self::Flush { handler, .. } => {
                ErrorCode::new(Layer::Handler, handler.clone(), Category::Io).recoverable()
            }
            Self::SyncUnsupported { handler } => {
                ErrorCode::new(Layer::Handler, handler.clone(), Category::Configuration)
            }
            Self::Processor { source, .. } => source.code(),
            Self::Renderer { source, .. } => source.code(),
        }
    }
}

/// Result type for handler operations
pub type Result<T> = std::result::Result<T, HandlerError>;
