//! Error handling for Selkit
//!
//! Provides the error types shared by the selection engine:
//! - Resolve errors (document/object/sub-element lookup)
//! - Observer errors (faults surfaced by notification handlers)
//!
//! All error types use `thiserror` for ergonomic error handling.
//!
//! Not-found conditions on the hot add/remove paths are deliberately NOT
//! routed through these types; those paths return `bool`/`Option` because
//! selection operations are routinely issued against stale references.
//! The query-oriented entry points used by binding layers surface the
//! taxonomy below.

use thiserror::Error;

/// Reference resolution error type
///
/// Represents failures while mapping a raw (document, object, sub-element)
/// triple onto the host document model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No document carries the requested name
    #[error("Document not found: {document}")]
    DocumentNotFound {
        /// The document name that failed to resolve.
        document: String,
    },

    /// A document was requested implicitly but none is active
    #[error("No active document")]
    NoActiveDocument,

    /// The named object does not exist in the document
    #[error("Object '{object}' not found in document '{document}'")]
    ObjectNotFound {
        /// The document that was searched.
        document: String,
        /// The object name that failed to resolve.
        object: String,
    },

    /// The object exists but is mid-deletion and must not be referenced
    #[error("Object '{object}' in document '{document}' is being removed")]
    ObjectPendingRemoval {
        /// The document holding the object.
        document: String,
        /// The object that is being removed.
        object: String,
    },

    /// The sub-element path does not resolve against the object
    #[error("Sub-element '{sub_element}' does not resolve on {document}#{object}")]
    SubObjectNotFound {
        /// The document holding the object.
        document: String,
        /// The object the path was resolved against.
        object: String,
        /// The sub-element path that failed to resolve.
        sub_element: String,
    },
}

/// Main error type for Selkit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Reference resolution error
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// An observer handler reported a failure during notification drain
    #[error("Observer error: {0}")]
    Observer(String),

    /// Standard I/O error (replay log sinks)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create an observer error from a string message
    pub fn observer(msg: impl Into<String>) -> Self {
        Error::Observer(msg.into())
    }

    /// Check if this is a not-found resolution error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Resolve(
                ResolveError::DocumentNotFound { .. }
                    | ResolveError::NoActiveDocument
                    | ResolveError::ObjectNotFound { .. }
                    | ResolveError::SubObjectNotFound { .. }
            )
        )
    }

    /// Check if this is a resolution error of any kind
    pub fn is_resolve_error(&self) -> bool {
        matches!(self, Error::Resolve(_))
    }

    /// Check if this is an observer fault
    pub fn is_observer_error(&self) -> bool {
        matches!(self, Error::Observer(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
