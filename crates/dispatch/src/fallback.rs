//! Fallback error channel
//!
//! Async-path errors cannot reach the caller that enqueued the record - it
//! has long since returned. The worker reports them here instead: one line
//! per failure on standard error, with a fixed `[ko-log:error]` prefix and
//! the structured error code, so operators can grep the stream without
//! parsing free-form messages.
//!
//! The writer is injectable so tests can capture the channel.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use kolog_core::ErrorCode;

/// Prefix on every fallback line
pub const FALLBACK_PREFIX: &str = "[ko-log:error]";

/// Destination for errors the worker cannot surface
pub struct FallbackChannel {
    out: Mutex<Box<dyn Write + Send>>,
}

impl FallbackChannel {
    /// Channel writing to standard error (the default)
    #[must_use]
    pub fn stderr() -> Self {
        Self::from_writer(std::io::stderr())
    }

    /// Channel writing to an arbitrary writer
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    /// Channel writing into an in-memory buffer, for tests
    #[must_use]
    pub fn capture() -> (Self, FallbackCapture) {
        let buffer = FallbackCapture::default();
        let writer = buffer.clone();
        (Self::from_writer(writer), buffer)
    }

    /// Report one error; failures to write are swallowed - the fallback
    /// channel is the last resort and has nowhere left to report to
    pub(crate) fn report(&self, code: &ErrorCode, error: &dyn std::fmt::Display) {
        let mut out = self.out.lock();
        let _ = writeln!(out, "{FALLBACK_PREFIX} {code} {error}");
        let _ = out.flush();
    }
}

impl Default for FallbackChannel {
    fn default() -> Self {
        Self::stderr()
    }
}

/// Shared in-memory capture of the fallback channel
#[derive(Debug, Clone, Default)]
pub struct FallbackCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl FallbackCapture {
    /// Everything written so far
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Captured lines in write order
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for FallbackCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kolog_core::{Category, Layer};

    #[test]
    fn test_report_line_shape() {
        let (channel, capture) = FallbackChannel::capture();
        let code = ErrorCode::new(Layer::Handler, "file", Category::Io);

        channel.report(&code, &"write failed");

        assert_eq!(
            capture.lines(),
            vec!["[ko-log:error] HANDLER::file::IO::ERROR write failed"]
        );
    }

    #[test]
    fn test_reports_accumulate_in_order() {
        let (channel, capture) = FallbackChannel::capture();
        let code = ErrorCode::new(Layer::Dispatch, "queue_manager", Category::Routing);

        channel.report(&code, &"first");
        channel.report(&code, &"second");

        let lines = capture.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first"));
        assert!(lines[1].ends_with("second"));
    }
}
