//! Rotating file handler - size/time triggered backup rotation
//!
//! Extends the file handler with a rotation policy. For base path `P` and
//! `backup_count = N`, the layout on disk is the current file `P` and
//! backups `P.1` (newest) through `P.N` (oldest); `P.(N+1)` never exists.
//!
//! Rotation runs entirely under the handler's write lock, so no write can
//! observe a half-rotated state. Renames run from the highest index down
//! to avoid overwriting a younger backup. A failed rename aborts rotation,
//! restores the original file in append mode and surfaces a handler I/O
//! error; the pending write is then retried once against the restored
//! handle.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use kolog_core::{ConfigurationError, Processor, Record, Renderer};

use crate::error::{HandlerError, Result};
use crate::file::{open_destination, release, write_line, FileConfig, FileState, OpenMode};
use crate::handler::Handler;
use crate::pipeline::EmitPipeline;
use crate::sink::Sink;

/// When and how to rotate the destination file
#[derive(Debug, Clone, Default)]
pub struct RotationPolicy {
    /// Rotate before a write that would push the file past this many bytes;
    /// `0` disables the size trigger
    pub max_bytes: u64,

    /// Number of backup generations to keep; `0` means rotation truncates
    /// the file without producing any backup
    pub backup_count: u32,

    /// Rotate when this much time has passed since the last rotation;
    /// `None` disables the time trigger
    pub rotation_interval: Option<Duration>,
}

impl RotationPolicy {
    /// Policy with both triggers disabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the size trigger
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the number of backup generations
    #[must_use]
    pub fn with_backup_count(mut self, backup_count: u32) -> Self {
        self.backup_count = backup_count;
        self
    }

    /// Enable the time trigger
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.rotation_interval = Some(interval);
        self
    }
}

/// `P.k` for the base path `P`
fn backup_path(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Destination state guarded by the write lock
struct RotatingState {
    state: FileState,
    current_size: u64,
    last_rotation: Instant,
}

/// File handler with size/time rotation
pub struct RotatingFileHandler {
    config: FileConfig,
    policy: RotationPolicy,
    pipeline: EmitPipeline,
    inner: Mutex<RotatingState>,
    async_lock: AsyncMutex<()>,
}

impl RotatingFileHandler {
    /// Create a rotating file handler; the file opens lazily on first write
    pub fn new(
        config: FileConfig,
        policy: RotationPolicy,
        renderer: Arc<dyn Renderer>,
        processors: Vec<Arc<dyn Processor>>,
    ) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            config,
            policy,
            pipeline: EmitPipeline::new("rotating_file", renderer, processors, true),
            inner: Mutex::new(RotatingState {
                state: FileState::Unopened,
                current_size: 0,
                last_rotation: Instant::now(),
            }),
            async_lock: AsyncMutex::new(()),
        })
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.config.filename
    }

    fn should_rotate(&self, inner: &RotatingState, payload_len: u64) -> bool {
        let size_due = self.policy.max_bytes > 0
            && inner.current_size + payload_len > self.policy.max_bytes;
        let time_due = self
            .policy
            .rotation_interval
            .is_some_and(|interval| inner.last_rotation.elapsed() >= interval);
        size_due || time_due
    }

    /// Shift `P.k` to `P.(k+1)` from the highest index down, then move the
    /// current file to `P.1`; with `backup_count == 0` there is nothing to
    /// shift and the subsequent fresh open truncates in place
    fn shift_backups(&self) -> std::io::Result<()> {
        let n = self.policy.backup_count;
        if n == 0 {
            return Ok(());
        }

        let base = &self.config.filename;
        let oldest = backup_path(base, n);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        for k in (1..n).rev() {
            let src = backup_path(base, k);
            if src.exists() {
                std::fs::rename(&src, backup_path(base, k + 1))?;
            }
        }
        if base.exists() {
            std::fs::rename(base, backup_path(base, 1))?;
        }
        Ok(())
    }

    /// Rotate under the write lock; on failure, restore the original file
    /// in append mode so the pending write has a destination
    fn rotate(&self, inner: &mut RotatingState) -> Result<()> {
        let base = &self.config.filename;

        if let FileState::Open(mut file) = std::mem::replace(&mut inner.state, FileState::Unopened) {
            use std::io::Write;
            // Flush what we have; a failed flush only costs buffered bytes
            // already reported as written.
            let _ = file.flush();
            drop(file);
        }

        let fresh = self.shift_backups().and_then(|()| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(base)
        });

        match fresh {
            Ok(file) => {
                inner.state = FileState::Open(file);
                inner.current_size = 0;
                inner.last_rotation = Instant::now();
                tracing::debug!(
                    handler = self.name(),
                    path = %base.display(),
                    backups = self.policy.backup_count,
                    "file rotation completed"
                );
                Ok(())
            }
            Err(source) => {
                // Restore: reopen the (possibly still present) base file in
                // append mode and re-stat it so the size trigger stays honest.
                match OpenOptions::new().create(true).append(true).open(base) {
                    Ok(file) => {
                        inner.current_size =
                            std::fs::metadata(base).map(|m| m.len()).unwrap_or(0);
                        inner.state = FileState::Open(file);
                    }
                    Err(reopen) => {
                        tracing::warn!(
                            handler = self.name(),
                            path = %base.display(),
                            error = %reopen,
                            "could not restore destination after failed rotation"
                        );
                    }
                }
                Err(HandlerError::Rotate {
                    handler: self.name().to_string(),
                    path: base.clone(),
                    source,
                })
            }
        }
    }

    fn write_payload(&self, payload: &str) -> Result<()> {
        let mut inner = self.inner.lock();

        if inner.state.is_closed() {
            return Err(HandlerError::Closed {
                handler: self.name().to_string(),
            });
        }
        if matches!(inner.state, FileState::Unopened) {
            let file = open_destination(&self.config, self.name())?;
            inner.current_size = match self.config.mode {
                OpenMode::Append => file.metadata().map(|m| m.len()).unwrap_or(0),
                OpenMode::Truncate => 0,
            };
            inner.last_rotation = Instant::now();
            inner.state = FileState::Open(file);
        }

        let payload_len = payload.len() as u64;
        let mut rotation_error = None;
        if self.should_rotate(&inner, payload_len) {
            if let Err(err) = self.rotate(&mut inner) {
                rotation_error = Some(err);
            }
        }

        // The pending write gets exactly one attempt against whatever
        // handle survived; a rotation error is still surfaced afterwards.
        if let FileState::Open(ref mut file) = inner.state {
            write_line(file, payload, self.name())?;
            inner.current_size += payload_len;
        }

        match rotation_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Handler for RotatingFileHandler {
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
        use std::io::Write;
        let mut inner = self.inner.lock();
        if let FileState::Open(ref mut file) = inner.state {
            file.flush().map_err(|source| HandlerError::Flush {
                handler: self.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let _guard = self.async_lock.lock().await;
        let mut inner = self.inner.lock();
        match std::mem::replace(&mut inner.state, FileState::Closing) {
            FileState::Open(file) => {
                let result = release(file, self.name());
                inner.state = FileState::Closed;
                result
            }
            FileState::Unopened | FileState::Closing | FileState::Closed => {
                inner.state = FileState::Closed;
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
#[path = "rotating_test.rs"]
mod rotating_test;
