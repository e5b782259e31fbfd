//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The index lock was poisoned by a panicking writer.
    #[error("search index lock poisoned")]
    LockPoisoned,
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
