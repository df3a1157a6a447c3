//! Error types for world, view and dispatch operations.

use std::fmt;

/// How bad a handler failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The event was not handled, but the loop can keep going.
    Recoverable,
    /// The application wants the driving loop to stop.
    Fatal,
}

/// Failure reported by an application event handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    pub severity: Severity,
    pub message: String,
}

impl HandlerError {
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Recoverable,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Recoverable => write!(f, "handler failed: {}", self.message),
            Severity::Fatal => write!(f, "handler failed fatally: {}", self.message),
        }
    }
}

impl std::error::Error for HandlerError {}

/// Result returned by application event handlers.
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Which half of a graphics-context scope failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextStage {
    Enter,
    Leave,
}

impl fmt::Display for ContextStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextStage::Enter => f.write_str("enter"),
            ContextStage::Leave => f.write_str("leave"),
        }
    }
}

/// Errors that can occur in the dispatch core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An owned buffer could not be allocated. Prior state is untouched.
    OutOfMemory {
        /// Number of bytes that were requested.
        requested: usize,
    },

    /// An operation was invoked in a state where it is not allowed.
    ///
    /// This always points at a bug in the platform glue.
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// Why the current state forbids it.
        reason: &'static str,
    },

    /// The application event handler reported a failure.
    Handler(HandlerError),

    /// Entering or leaving the graphics context failed.
    Context {
        stage: ContextStage,
        message: String,
    },

    /// The platform failed to create world or view internals.
    Platform {
        message: String,
    },

    /// A view handle refers to a view that no longer exists.
    UnknownView,
}

impl Error {
    /// Whether the driving loop should stop because of this error.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Handler(err) => err.is_fatal(),
            Error::Context { .. } | Error::Platform { .. } | Error::OutOfMemory { .. } => true,
            Error::InvalidState { .. } | Error::UnknownView => false,
        }
    }

    pub fn context(stage: ContextStage, message: impl Into<String>) -> Self {
        Error::Context {
            stage,
            message: message.into(),
        }
    }

    pub fn platform(message: impl Into<String>) -> Self {
        Error::Platform {
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfMemory { requested } => {
                write!(f, "Out of memory allocating {} bytes", requested)
            }
            Error::InvalidState { operation, reason } => {
                write!(f, "Invalid state for {}: {}", operation, reason)
            }
            Error::Handler(err) => write!(f, "{}", err),
            Error::Context { stage, message } => {
                write!(f, "Failed to {} graphics context: {}", stage, message)
            }
            Error::Platform { message } => write!(f, "Platform error: {}", message),
            Error::UnknownView => write!(f, "View does not exist"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Handler(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HandlerError> for Error {
    fn from(err: HandlerError) -> Self {
        Error::Handler(err)
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
