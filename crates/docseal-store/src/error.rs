use docseal_types::ContentHash;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(ContentHash),

    /// Recomputed hash differs from the key the blob is stored under.
    #[error("hash mismatch for {expected}: computed {computed}")]
    HashMismatch {
        expected: ContentHash,
        computed: ContentHash,
    },

    /// I/O error from the underlying storage backend.
    #[error("storage unavailable: {0}")]
    Io(#[from] std::io::Error),

    /// The backend cannot serve requests (poisoned lock, unreadable layout).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
