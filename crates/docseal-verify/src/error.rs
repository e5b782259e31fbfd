use docseal_ledger::LedgerError;
use docseal_registry::RegistryError;
use docseal_store::StoreError;

/// Errors that prevent a verification from producing a result.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type VerifyResult<T> = Result<T, VerifyError>;
