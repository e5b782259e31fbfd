use docseal_types::{ContentHash, DocumentId, VersionRef};

use crate::error::LedgerResult;
use crate::record::{AnchorRecord, LedgerStatus};
use crate::validation::ValidationReport;

/// Append-only, strictly ordered log of content anchors.
///
/// No operation rewrites or reorders existing records.
pub trait IntegrityLedger: Send + Sync {
    /// Commit `content_hash` for `version` at the next sequence.
    ///
    /// Returns the `Confirmed` record once the journal write is durable.
    /// If the write fails the record is kept as `Failed` and
    /// `LedgerError::AnchorFailure` is returned; callers retry with a fresh
    /// call, which is assigned a new sequence.
    fn anchor(&self, content_hash: ContentHash, version: VersionRef) -> LedgerResult<AnchorRecord>;

    /// `Confirmed` if any confirmed record commits `content_hash`.
    fn verify(&self, content_hash: &ContentHash) -> LedgerResult<LedgerStatus>;

    /// The record at `sequence`, if any.
    fn record(&self, sequence: u64) -> LedgerResult<Option<AnchorRecord>>;

    /// Every record in sequence order.
    fn records(&self) -> LedgerResult<Vec<AnchorRecord>>;

    /// The most recent confirmed record for `content_hash`.
    fn latest_confirmed(&self, content_hash: &ContentHash) -> LedgerResult<Option<AnchorRecord>>;

    /// The most recent confirmed record anchoring any version of `document`.
    fn latest_for_document(&self, document: &DocumentId) -> LedgerResult<Option<AnchorRecord>>;

    /// Number of records, including failed ones.
    fn len(&self) -> LedgerResult<u64>;

    /// Walk the whole log and report every integrity violation.
    fn validate(&self) -> LedgerResult<ValidationReport>;

    fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }
}
