/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The journal write for an anchor failed. A `Failed` record holding
    /// `sequence` is journaled; retry with a fresh `anchor` call.
    #[error("anchor failure at seq {sequence}: {reason}")]
    AnchorFailure { sequence: u64, reason: String },

    /// Duplicate or reordered sequence detected. Fatal.
    #[error("sequence corruption: expected seq {expected}, found {found}")]
    SequenceCorruption { expected: u64, found: u64 },

    /// Anchoring was halted after corruption was detected.
    #[error("ledger halted: {0}")]
    Halted(String),

    #[error("anchor record not found: seq {0}")]
    RecordNotFound(u64),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("journal I/O error: {0}")]
    Io(String),

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// Whether the ledger can no longer accept anchors.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SequenceCorruption { .. } | Self::Halted(_))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
