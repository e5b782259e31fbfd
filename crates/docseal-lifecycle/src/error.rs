use docseal_index::IndexError;
use docseal_ledger::LedgerError;
use docseal_registry::RegistryError;
use docseal_store::StoreError;
use docseal_types::{DocumentId, VersionId};

use crate::state::{LifecycleEvent, LifecycleState};

/// Errors surfaced by lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Input rejected before any I/O.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// The caller's expected version is not current.
    #[error("concurrent modification of {document}: expected {expected}, current {current}")]
    ConcurrentModification {
        document: DocumentId,
        expected: VersionId,
        current: VersionId,
    },

    /// Another write held the document for longer than the lock timeout.
    #[error("document {0} is busy")]
    Busy(DocumentId),

    /// The content store kept failing after retries.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Anchoring kept failing after retries.
    #[error("anchor failed after {attempts} attempts: {reason}")]
    AnchorFailure { attempts: u32, reason: String },

    /// The ledger detected corruption and refuses further anchors.
    #[error("ledger halted: {0}")]
    LedgerHalted(String),

    #[error("illegal lifecycle transition: {event} from {from}")]
    InvalidTransition {
        from: LifecycleState,
        event: LifecycleEvent,
    },

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Ledger(LedgerError),

    #[error(transparent)]
    Registry(RegistryError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LifecycleError {
    /// Whether the caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Busy(_) | Self::StorageUnavailable(_) | Self::AnchorFailure { .. }
        )
    }
}

impl From<RegistryError> for LifecycleError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => Self::NotFound(id),
            RegistryError::ConcurrentModification {
                document,
                expected,
                current,
            } => Self::ConcurrentModification {
                document,
                expected,
                current,
            },
            RegistryError::Validation(msg) => Self::Validation(msg),
            RegistryError::Io(e) => Self::StorageUnavailable(e.to_string()),
            other => Self::Registry(other),
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        if err.is_transient() {
            Self::StorageUnavailable(err.to_string())
        } else {
            Self::Store(err)
        }
    }
}

impl From<LedgerError> for LifecycleError {
    fn from(err: LedgerError) -> Self {
        match err {
            e if e.is_fatal() => Self::LedgerHalted(e.to_string()),
            LedgerError::AnchorFailure { reason, .. } => Self::AnchorFailure {
                attempts: 1,
                reason,
            },
            other => Self::Ledger(other),
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
