use std::fmt;

use docseal_ledger::{LedgerStatus, ValidationReport};
use docseal_types::{ContentHash, DocumentId, VersionId};
use serde::Serialize;

/// Why a version failed verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DriftReason {
    /// Stored bytes no longer hash to the version's content hash.
    HashMismatch,
    /// No blob is stored under the version's content hash.
    ContentMissing,
    /// No confirmed anchor exists for the content hash.
    Unanchored,
    /// The version's anchor commits a different hash.
    AnchorMismatch { anchored_hash: ContentHash },
}

impl fmt::Display for DriftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashMismatch => write!(f, "stored content does not match its hash"),
            Self::ContentMissing => write!(f, "content missing from store"),
            Self::Unanchored => write!(f, "content hash is not anchored"),
            Self::AnchorMismatch { anchored_hash } => {
                write!(f, "anchor commits a different hash ({})", anchored_hash.short_hex())
            }
        }
    }
}

/// Outcome of verifying one document version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub document_id: DocumentId,
    pub version_id: VersionId,
    /// Hash recomputed from stored bytes. `None` if the bytes are missing.
    pub content_hash: Option<ContentHash>,
    /// Hash the registry records for the version.
    pub expected_hash: ContentHash,
    pub ledger_status: LedgerStatus,
    /// `true` when the bytes are intact and confirmed in the ledger.
    pub matches: bool,
    pub drift: Option<DriftReason>,
}

/// Whole-system audit: every version of every document, plus the ledger chain.
#[derive(Clone, Debug, Serialize)]
pub struct AuditReport {
    pub versions: Vec<VerificationResult>,
    pub ledger: ValidationReport,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.ledger.is_valid() && self.versions.iter().all(|v| v.matches)
    }

    /// Versions that failed verification.
    pub fn drifted(&self) -> impl Iterator<Item = &VerificationResult> {
        self.versions.iter().filter(|v| !v.matches)
    }
}
