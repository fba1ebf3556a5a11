//! Structured error codes and the core error kinds
//!
//! Every Ko-Log error carries a structured code of the form
//! `LAYER::Component::CATEGORY::SEVERITY[::RECOVERABLE]`, e.g.
//! `HANDLER::file::IO::ERROR::RECOVERABLE`. The code is what the fallback
//! error channel prints, so telemetry can be grepped by layer or category
//! without parsing free-form messages.
//!
//! The handler and dispatch crates define their own error enums (each with
//! a `code()` method) on top of the [`ErrorCode`] machinery here.

use std::borrow::Cow;

use thiserror::Error;

/// System layer where an error originated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Configuration validation
    Configuration,
    /// Logger/handler assembly
    Factory,
    /// Queue manager routing and dispatch
    Dispatch,
    /// Handler destination I/O
    Handler,
    /// Processors and renderers
    Processor,
}

impl Layer {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "CONFIGURATION",
            Self::Factory => "FACTORY",
            Self::Dispatch => "DISPATCH",
            Self::Handler => "HANDLER",
            Self::Processor => "PROCESSOR",
        }
    }
}

/// Kind of problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Structural configuration problem
    Configuration,
    /// Transforming or rendering data
    Formatting,
    /// Deciding where data goes
    Routing,
    /// Input validation
    Validation,
    /// Destination input/output
    Io,
    /// Catch-all for unexpected failures
    Unexpected,
}

impl Category {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "CONFIGURATION",
            Self::Formatting => "FORMATTING",
            Self::Routing => "ROUTING",
            Self::Validation => "VALIDATION",
            Self::Io => "IO",
            Self::Unexpected => "UNEXPECTED",
        }
    }
}

/// Error severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

impl Severity {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Structured error code: `LAYER::Component::CATEGORY::SEVERITY[::RECOVERABLE]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    pub layer: Layer,
    pub component: Cow<'static, str>,
    pub category: Category,
    pub severity: Severity,
    pub recoverable: bool,
}

impl ErrorCode {
    /// Build a non-recoverable code at `Error` severity
    pub fn new(layer: Layer, component: impl Into<Cow<'static, str>>, category: Category) -> Self {
        Self {
            layer,
            component: component.into(),
            category,
            severity: Severity::Error,
            recoverable: false,
        }
    }

    /// Mark the coded operation as retryable
    #[must_use]
    pub fn recoverable(mut self) -> Self {
        self.recoverable = true;
        self
    }

    /// Override the severity
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}::{}::{}::{}",
            self.layer.as_str(),
            self.component,
            self.category.as_str(),
            self.severity.as_str()
        )?;
        if self.recoverable {
            write!(f, "::RECOVERABLE")?;
        }
        Ok(())
    }
}

// =============================================================================
// Core error kinds
// =============================================================================

/// Invalid or unknown logger/handler/processor configuration
///
/// Raised at registration or factory time; never recoverable.
#[derive(Debug, Error)]
#[error("invalid configuration for `{component}`: {message}")]
pub struct ConfigurationError {
    /// Component whose configuration was rejected
    pub component: String,
    /// What was wrong
    pub message: String,
}

impl ConfigurationError {
    pub fn new(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        ErrorCode::new(
            Layer::Configuration,
            self.component.clone(),
            Category::Validation,
        )
    }
}

/// Assembly of a logger failed
///
/// Composes the underlying processor or handler failure as its source.
#[derive(Debug, Error)]
#[error("failed to assemble logger `{logger}`: {message}")]
pub struct LoggerCreationError {
    /// Logger being assembled
    pub logger: String,
    /// What failed
    pub message: String,
    /// Underlying cause, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl LoggerCreationError {
    pub fn new(logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ErrorCode {
        ErrorCode::new(Layer::Factory, self.logger.clone(), Category::Configuration)
    }
}

/// A processor raised unexpectedly
///
/// Distinct from the drop control signal ([`Processed::Drop`]); a drop is a
/// normal outcome, this is a failure isolated to one handler.
///
/// [`Processed::Drop`]: crate::Processed::Drop
#[derive(Debug, Error)]
#[error("processor `{processor}` failed: {message}")]
pub struct ProcessorError {
    /// Name of the failing processor
    pub processor: String,
    /// What failed
    pub message: String,
}

impl ProcessorError {
    pub fn new(processor: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            processor: processor.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        ErrorCode::new(Layer::Processor, self.processor.clone(), Category::Formatting)
    }
}

/// A renderer raised unexpectedly
#[derive(Debug, Error)]
#[error("renderer `{renderer}` failed: {message}")]
pub struct RendererError {
    /// Name of the failing renderer
    pub renderer: String,
    /// What failed
    pub message: String,
}

impl RendererError {
    pub fn new(renderer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            renderer: renderer.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        ErrorCode::new(Layer::Processor, self.renderer.clone(), Category::Formatting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display() {
        let code = ErrorCode::new(Layer::Handler, "file", Category::Io);
        assert_eq!(code.to_string(), "HANDLER::file::IO::ERROR");
    }

    #[test]
    fn test_code_display_recoverable() {
        let code = ErrorCode::new(Layer::Handler, "file", Category::Io).recoverable();
        assert_eq!(code.to_string(), "HANDLER::file::IO::ERROR::RECOVERABLE");
    }

    #[test]
    fn test_code_display_severity() {
        let code = ErrorCode::new(Layer::Dispatch, "queue", Category::Routing)
            .with_severity(Severity::Warning);
        assert_eq!(code.to_string(), "DISPATCH::queue::ROUTING::WARNING");
    }

    #[test]
    fn test_configuration_error_code() {
        let err = ConfigurationError::new("queue", "max_queue_size must be positive");
        assert_eq!(err.code().to_string(), "CONFIGURATION::queue::VALIDATION::ERROR");
        assert!(err.to_string().contains("max_queue_size"));
    }

    #[test]
    fn test_logger_creation_error_composes_cause() {
        let cause = ProcessorError::new("filter_by_level", "bad level");
        let err = LoggerCreationError::new("app", "processor setup failed").with_source(cause);

        assert_eq!(err.code().to_string(), "FACTORY::app::CONFIGURATION::ERROR");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_processor_error_code() {
        let err = ProcessorError::new("add_context_defaults", "boom");
        assert_eq!(
            err.code().to_string(),
            "PROCESSOR::add_context_defaults::FORMATTING::ERROR"
        );
    }
}
