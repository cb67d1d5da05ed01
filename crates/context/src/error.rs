use thiserror::Error;

/// Errors surfaced by the data-context.
///
/// The kinds stay distinct (conflict vs. not-found vs. storage) so callers
/// upstream can tell a constraint violation from a connectivity problem.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A staged change conflicts with the committed state, e.g. inserting
    /// a duplicate key or opening a second transaction scope.
    #[error("conflict on {entity}: {message}")]
    Conflict {
        entity: &'static str,
        message: String,
    },

    /// A staged change targets an entity that does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// The underlying storage failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for data-context operations.
pub type Result<T> = std::result::Result<T, ContextError>;
