//! Error types for catalog operations.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur during catalog operations.
///
/// `NotFound` and `Duplicate` are recoverable and expected in normal control
/// flow (probing for a table, racing on a name). `CorruptRecord` poisons the
/// specific record it names; `Backend` propagates storage failures verbatim,
/// leaving retry policy to the backend or the caller.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A name, id, or column lookup missed.
    #[error("not found: {message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },

    /// Attempted creation under a name or coordinate that already exists.
    #[error("duplicate: {message}")]
    Duplicate {
        /// Description of the colliding entity.
        message: String,
    },

    /// A persisted record failed to decode or validate.
    #[error("corrupt record at {path}: {message}")]
    CorruptRecord {
        /// Dataset-relative path of the offending record.
        path: String,
        /// What made the record unusable.
        message: String,
    },

    /// The storage backend reported an I/O failure.
    #[error(transparent)]
    Backend(#[from] framehouse_core::Error),
}

impl CatalogError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate {
            message: message.into(),
        }
    }

    /// Creates a corrupt-record error for the record at `path`.
    #[must_use]
    pub fn corrupt(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error is a recoverable not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
