//! File handler - lazy-open single-file destination
//!
//! The file is not touched at construction: the handle opens on the first
//! successful pipeline run and the handler carries its lifecycle as an
//! explicit state machine rather than an ambient null check:
//!
//! ```text
//! unopened --first write--> open --close--> closing --> closed
//! ```
//!
//! There is no transition out of `closed`; emissions after close fail with
//! a handler-closed error.
//!
//! Writes on both paths go through the same write lock with short critical
//! sections (one line write-and-flush). The async path additionally holds
//! a cooperative lock so concurrent async emissions queue without blocking
//! the worker thread pool.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use kolog_core::{ConfigurationError, Processor, Record, Renderer};

use crate::error::{HandlerError, Result};
use crate::handler::Handler;
use crate::pipeline::EmitPipeline;
use crate::sink::Sink;

/// How the destination file is opened on first write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Truncate any existing content (`wb`)
    Truncate,
    /// Append to existing content (`ab`, default)
    #[default]
    Append,
}

/// Configuration for file-backed handlers
#[derive(Debug, Clone)]
pub struct FileConfig {
    /// Destination path
    pub filename: PathBuf,

    /// Open behavior on first write
    pub mode: OpenMode,

    /// Payload encoding; only UTF-8 is representable
    pub encoding: String,

    /// Allow truncating a file that already exists
    pub override_existing: bool,
}

impl FileConfig {
    /// Config with append mode, UTF-8 and override allowed
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            mode: OpenMode::Append,
            encoding: "utf-8".to_string(),
            override_existing: true,
        }
    }

    /// Set the open mode
    #[must_use]
    pub fn with_mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Refuse to truncate an existing file
    #[must_use]
    pub fn keep_existing(mut self) -> Self {
        self.override_existing = false;
        self
    }

    /// Validate the config; payloads are Rust strings, so any encoding
    /// other than UTF-8 cannot be honored
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        let normalized = self.encoding.to_ascii_lowercase();
        if normalized != "utf-8" && normalized != "utf8" {
            return Err(ConfigurationError::new(
                "file",
                format!("unsupported encoding `{}`; only utf-8 is available", self.encoding),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a file destination
#[derive(Debug)]
pub(crate) enum FileState {
    Unopened,
    Open(File),
    Closing,
    Closed,
}

impl FileState {
    pub(crate) fn is_closed(&self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

/// Open the destination according to the config
///
/// Fails when the mode would truncate an existing file and
/// `override_existing` is false. Missing parent directories are created.
pub(crate) fn open_destination(config: &FileConfig, handler: &str) -> Result<File> {
    let open_err = |source: std::io::Error| HandlerError::Open {
        handler: handler.to_string(),
        path: config.filename.clone(),
        source,
    };

    if config.mode == OpenMode::Truncate && !config.override_existing && config.filename.exists() {
        return Err(open_err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "file exists and override_existing is disabled",
        )));
    }

    if let Some(parent) = config.filename.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(open_err)?;
        }
    }

    let file = match config.mode {
        OpenMode::Truncate => OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&config.filename),
        OpenMode::Append => OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.filename),
    }
    .map_err(open_err)?;

    tracing::debug!(
        handler = handler,
        path = %config.filename.display(),
        "opened destination file"
    );
    Ok(file)
}

/// Write one payload and flush, mapping failures to handler errors
pub(crate) fn write_line(file: &mut File, payload: &str, handler: &str) -> Result<()> {
    file.write_all(payload.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|source| HandlerError::Write {
            handler: handler.to_string(),
            source,
        })
}

/// Flush-then-release for `close`, mapping failures to handler errors
pub(crate) fn release(mut file: File, handler: &str) -> Result<()> {
    let flushed = file.flush();
    drop(file);
    flushed.map_err(|source| HandlerError::Close {
        handler: handler.to_string(),
        source,
    })
}

/// Handler that owns one log file
pub struct FileHandler {
    config: FileConfig,
    pipeline: EmitPipeline,
    state: Mutex<FileState>,
    async_lock: AsyncMutex<()>,
}

impl std::fmt::Debug for FileHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandler")
            .field("config", &self.config)
            .finish()
    }
}

impl FileHandler {
    /// Create a file handler; the file opens lazily on first write
    pub fn new(
        config: FileConfig,
        renderer: Arc<dyn Renderer>,
        processors: Vec<Arc<dyn Processor>>,
    ) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            config,
            pipeline: EmitPipeline::new("file", renderer, processors, true),
            state: Mutex::new(FileState::Unopened),
            async_lock: AsyncMutex::new(()),
        })
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.config.filename
    }

    /// Write under the handler's write lock, opening lazily
    fn write_payload(&self, payload: &str) -> Result<()> {
        let mut state = self.state.lock();

        if matches!(*state, FileState::Unopened) {
            *state = FileState::Open(open_destination(&self.config, self.name())?);
        }
        match *state {
            FileState::Open(ref mut file) => write_line(file, payload, self.name()),
            FileState::Unopened | FileState::Closing | FileState::Closed => {
                Err(HandlerError::Closed {
                    handler: self.name().to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl Handler for FileHandler {
    fn name(&self) -> &str {
        self.pipeline.handler_name()
    }

    fn emit_sync(&self, record: &Record) -> Result<()> {
        match self.pipeline.run(record)? {
            Some(payload) => self.write_payload(&payload),
            None => Ok(()),
        }
    }

    async fn emit_async(&self, record: &Record) -> Result<()> {
        match self.pipeline.run(record)? {
            Some(payload) => {
                let _guard = self.async_lock.lock().await;
                self.write_payload(&payload)
            }
            None => Ok(()),
        }
    }

    async fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        if let FileState::Open(ref mut file) = *state {
            file.flush().map_err(|source| HandlerError::Flush {
                handler: self.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let _guard = self.async_lock.lock().await;
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, FileState::Closing) {
            FileState::Open(file) => {
                let result = release(file, self.name());
                *state = FileState::Closed;
                result
            }
            // Unopened handlers have nothing to release; repeated closes
            // are no-ops.
            FileState::Unopened | FileState::Closing | FileState::Closed => {
                *state = FileState::Closed;
                Ok(())
            }
        }
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
#[path = "file_test.rs"]
mod file_test;
