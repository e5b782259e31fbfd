use docseal_index::IndexError;
use docseal_ledger::LedgerError;
use docseal_lifecycle::LifecycleError;
use docseal_registry::RegistryError;
use docseal_store::StoreError;
use docseal_types::{ContentHash, DocumentId, VersionId};
use docseal_verify::VerifyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    #[error("version {version} not found for document {document}")]
    VersionNotFound {
        document: DocumentId,
        version: VersionId,
    },

    #[error("concurrent modification of {document}: expected {expected}, current {current}")]
    ConcurrentModification {
        document: DocumentId,
        expected: VersionId,
        current: VersionId,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("document {0} is busy")]
    Busy(DocumentId),

    /// Stored bytes no longer match their content hash.
    #[error("content hash mismatch for {expected}: computed {computed}")]
    HashMismatch {
        expected: ContentHash,
        computed: ContentHash,
    },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("anchor failed after {attempts} attempts: {reason}")]
    AnchorFailure { attempts: u32, reason: String },

    #[error("ledger halted: {0}")]
    LedgerHalted(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("lifecycle error: {0}")]
    Lifecycle(LifecycleError),

    #[error("registry error: {0}")]
    Registry(RegistryError),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<LifecycleError> for SdkError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(msg) => Self::Validation(msg),
            LifecycleError::NotFound(id) => Self::NotFound(id),
            LifecycleError::ConcurrentModification {
                document,
                expected,
                current,
            } => Self::ConcurrentModification {
                document,
                expected,
                current,
            },
            LifecycleError::Busy(id) => Self::Busy(id),
            LifecycleError::StorageUnavailable(msg) => Self::StorageUnavailable(msg),
            LifecycleError::AnchorFailure { attempts, reason } => {
                Self::AnchorFailure { attempts, reason }
            }
            LifecycleError::LedgerHalted(msg) => Self::LedgerHalted(msg),
            LifecycleError::Registry(e) => e.into(),
            LifecycleError::Store(e) => e.into(),
            LifecycleError::Index(e) => Self::Index(e),
            other => Self::Lifecycle(other),
        }
    }
}

impl From<RegistryError> for SdkError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => Self::NotFound(id),
            RegistryError::VersionNotFound { document, version } => {
                Self::VersionNotFound { document, version }
            }
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

impl From<StoreError> for SdkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::HashMismatch { expected, computed } => {
                Self::HashMismatch { expected, computed }
            }
            e if e.is_transient() => Self::StorageUnavailable(e.to_string()),
            other => Self::Store(other),
        }
    }
}

impl From<LedgerError> for SdkError {
    fn from(err: LedgerError) -> Self {
        match err {
            e if e.is_fatal() => Self::LedgerHalted(e.to_string()),
            other => Self::Ledger(other),
        }
    }
}

impl From<VerifyError> for SdkError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Registry(e) => e.into(),
            VerifyError::Store(e) => e.into(),
            VerifyError::Ledger(e) => e.into(),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
