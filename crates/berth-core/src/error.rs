//! Error types and result aliases for Berth.
//!
//! Lost optimistic-concurrency races are *not* errors: the document store
//! reports them as values (see [`crate::document::CommitOutcome`]) and the
//! ledgers translate them into `false` returns. The variants here cover the
//! unexpected conditions that must propagate to the caller.

use std::fmt;

/// The result type used throughout Berth.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Berth operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {message}")]
    InvalidId {
        /// Description of what made the identifier invalid.
        message: String,
    },

    /// A storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// A version-checked write lost its race and the operation has no
    /// `false`-return path to report it through.
    #[error("concurrency conflict on document {document}: {message}")]
    Conflict {
        /// The identifier of the document whose expected version was stale.
        document: String,
        /// Description of the conflict.
        message: String,
    },

    /// A document that the operation requires was not found.
    #[error("not found: {document}")]
    NotFound {
        /// The identifier of the missing document.
        document: String,
    },

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new serialization error for the given document.
    #[must_use]
    pub fn serialization(document: impl fmt::Display, cause: impl fmt::Display) -> Self {
        Self::Serialization {
            message: format!("{document}: {cause}"),
        }
    }

    /// Creates a new conflict error for the given document.
    #[must_use]
    pub fn conflict(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            document: document.into(),
            message: message.into(),
        }
    }
}
