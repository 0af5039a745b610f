//! Engine error types.

use crate::persist::StorageError;

/// Errors surfaced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A named adventure, character or monster does not exist
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// The operation would break a model invariant; nothing was written
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The storage collaborator failed
    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { kind, name } => EngineError::NotFound { kind, name },
            other => EngineError::Storage(other),
        }
    }
}

impl EngineError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        EngineError::InvariantViolation(message.into())
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
