//! Ko-Log - Core
//!
//! The value types and contracts shared by the handler and dispatch crates:
//!
//! - [`Level`] - ordered severity levels
//! - [`EventData`] - the mutable mapping processors transform
//! - [`Record`] - the immutable envelope dispatched through the queue
//! - [`Processor`] / [`Renderer`] - the pipeline contracts, with the drop
//!   signal modelled as a distinguished control outcome
//! - [`ErrorCode`] and the cross-cutting error kinds
//!
//! # Data Flow
//!
//! ```text
//! [log call] --> EventData --> logger processors --> Record (frozen)
//!                                                      |
//!                             queue manager <----------+
//!                                  |
//!              per handler: processors --> renderer --> payload --> write
//! ```

mod error;
mod event;
mod level;
mod processor;
mod record;
mod renderer;

pub use error::{
    Category, ConfigurationError, ErrorCode, Layer, LoggerCreationError, ProcessorError,
    RendererError, Severity,
};
pub use event::EventData;
pub use level::{Level, UnknownLevel};
pub use processor::{
    AddContextDefaults, FilterByLevel, FilterKeys, Processed, Processor, ProcessorFn,
};
pub use record::Record;
pub use renderer::{JsonRenderer, MessageRenderer, PlainRenderer, Rendered, Renderer, RendererFn};
