//! Ko-Log - Handlers
//!
//! Destination-owning writers for the dispatch layer. Each handler pairs a
//! destination resource with its own processors and renderer and exposes
//! the same pipeline on a blocking and a cooperative path.
//!
//! ```text
//! [Record] --> copy event data --> processors --> renderer --> payload
//!                                      |              |
//!                                    (drop)         (drop)
//!                                                     |
//!                                        [sink?] --> write (sync | async)
//! ```
//!
//! # Available Handlers
//!
//! | Handler | Destination | Line-oriented |
//! |---------|-------------|---------------|
//! | [`NullHandler`] | none (pipeline + sink only) | yes |
//! | [`StreamHandler`] | stdout / stderr | yes |
//! | [`FileHandler`] | single file, lazy open | yes |
//! | [`RotatingFileHandler`] | file with size/time rotation | yes |
//!
//! Failures never cross handler boundaries: every error is tagged with the
//! handler it belongs to, and the dispatch layer catches them per handler.

mod error;
mod file;
mod handler;
mod null;
mod pipeline;
mod rotating;
mod sink;
mod stream;

pub use error::{HandlerError, Result};
pub use file::{FileConfig, FileHandler, OpenMode};
pub use handler::Handler;
pub use null::NullHandler;
pub use rotating::{RotatingFileHandler, RotationPolicy};
pub use sink::Sink;
pub use stream::StreamHandler;
