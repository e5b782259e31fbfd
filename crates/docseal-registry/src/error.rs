//! Error types for registry operations.

use std::path::PathBuf;

use docseal_types::{DocumentId, VersionId};
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The document does not exist, or is deleted and deleted documents
    /// were not requested.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// The requested version is not part of the document's lineage.
    #[error("version {version} not found for document {document}")]
    VersionNotFound {
        document: DocumentId,
        version: VersionId,
    },

    /// The caller's expected version is stale, or another write is in
    /// flight for the same document.
    #[error("concurrent modification of {document}: expected {expected}, current {current}")]
    ConcurrentModification {
        document: DocumentId,
        expected: VersionId,
        current: VersionId,
    },

    /// `publish`/`discard` named a version that is not the staged one.
    #[error("no staged version {version} for document {document}")]
    NotStaged {
        document: DocumentId,
        version: VersionId,
    },

    /// Input rejected before any state changed.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persisted record could not be decoded.
    #[error("corrupt registry record {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Serialization failure while encoding a record.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the backing directory.
    #[error("storage unavailable: {0}")]
    Io(#[from] std::io::Error),

    /// An internal lock was poisoned by a panicking writer.
    #[error("registry lock poisoned")]
    LockPoisoned,
}

/// Convenience type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
