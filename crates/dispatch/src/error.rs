//! The dispatch error taxonomy.
//!
//! The dispatcher is the single point that reclassifies arbitrary handler
//! failures, so every call site downstream of a dispatch sees the same
//! closed set of kinds.

use thiserror::Error;

/// A boxed, sendable error as handlers report it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A failed validation rule.
#[derive(Debug, Error)]
#[error("validation failed [{rule}]: {message}")]
pub struct ValidationError {
    /// Name of the rule that rejected the request.
    pub rule: &'static str,
    /// Human-readable description of the failure.
    pub message: String,
}

impl ValidationError {
    /// Builds a validation failure for `rule`.
    pub fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

/// Which kind of message a dispatch concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Command,
    Query,
    Event,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageKind::Command => "command",
            MessageKind::Query => "query",
            MessageKind::Event => "event",
        };
        f.write_str(name)
    }
}

/// Errors that can come out of a dispatch call.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A required input was absent at a public boundary.
    #[error("required argument missing: {0}")]
    InvalidArgument(&'static str),

    /// The request failed a validation rule; the handler never ran.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No handler is registered for the request's runtime type.
    #[error("no {kind} handler registered for {type_name}")]
    MissingHandler {
        kind: MessageKind,
        type_name: &'static str,
    },

    /// Persisting pending changes failed. The source keeps the storage
    /// error kind (conflict, not-found, connectivity) intact.
    #[error("persistence failed: {source}")]
    Persistence {
        #[source]
        source: BoxError,
    },

    /// The dispatch was cancelled. Never wrapped, so callers can tell
    /// "cancelled" from "failed".
    #[error("operation was cancelled")]
    Cancelled,

    /// Catch-all for handler failures that match no other kind. Always
    /// carries the original fault as its source.
    #[error("operation failed: {source}")]
    Operation {
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    /// Folds an arbitrary handler failure into the closed taxonomy.
    ///
    /// Already-classified errors pass through unchanged; validation errors
    /// keep their kind; everything else becomes [`DispatchError::Operation`]
    /// wrapping the original fault.
    pub fn classify(error: BoxError) -> DispatchError {
        let error = match error.downcast::<DispatchError>() {
            Ok(classified) => return *classified,
            Err(other) => other,
        };
        match error.downcast::<ValidationError>() {
            Ok(validation) => DispatchError::Validation(*validation),
            Err(other) => DispatchError::Operation { source: other },
        }
    }

    /// The metric label for this error kind.
    pub fn kind_label(&self) -> &'static str {
        match self {
            DispatchError::InvalidArgument(_) => "invalid_argument",
            DispatchError::Validation(_) => "validation",
            DispatchError::MissingHandler { .. } => "missing_handler",
            DispatchError::Persistence { .. } => "persistence",
            DispatchError::Cancelled => "cancelled",
            DispatchError::Operation { .. } => "operation",
        }
    }
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
