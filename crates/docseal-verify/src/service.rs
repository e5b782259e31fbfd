use std::sync::Arc;

use docseal_crypto::ContentHasher;
use docseal_ledger::{IntegrityLedger, ValidationReport};
use docseal_registry::{DocumentRegistry, DocumentVersion};
use docseal_store::{ContentStore, StoreError};
use docseal_types::{DocumentId, VersionId};
use tracing::{debug, warn};

use crate::error::VerifyResult;
use crate::types::{AuditReport, DriftReason, VerificationResult};

/// Recomputes content hashes and compares them against the ledger.
///
/// Reads only; shares its components with the lifecycle coordinator.
#[derive(Clone)]
pub struct VerificationService {
    store: Arc<dyn ContentStore>,
    registry: Arc<dyn DocumentRegistry>,
    ledger: Arc<dyn IntegrityLedger>,
}

impl VerificationService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        registry: Arc<dyn DocumentRegistry>,
        ledger: Arc<dyn IntegrityLedger>,
    ) -> Self {
        Self {
            store,
            registry,
            ledger,
        }
    }

    /// Verify the current version of a document, deleted or not.
    pub fn verify_document(&self, document: &DocumentId) -> VerifyResult<VerificationResult> {
        let version = self.registry.current_version(document, true)?;
        self.check(&version)
    }

    /// Verify a specific published version.
    pub fn verify_version(
        &self,
        document: &DocumentId,
        version: VersionId,
    ) -> VerifyResult<VerificationResult> {
        let version = self.registry.version(document, version)?;
        self.check(&version)
    }

    /// Verify every published version of every document, including
    /// deleted documents.
    pub fn verify_all(&self) -> VerifyResult<Vec<VerificationResult>> {
        let mut results = Vec::new();
        for doc in self.registry.list(true)? {
            for version in self.registry.versions(&doc.document_id, true)? {
                results.push(self.check(&version)?);
            }
        }
        Ok(results)
    }

    /// Validate the ledger's sequence and hash chain.
    pub fn verify_ledger(&self) -> VerifyResult<ValidationReport> {
        Ok(self.ledger.validate()?)
    }

    /// [`verify_all`](Self::verify_all) plus [`verify_ledger`](Self::verify_ledger).
    pub fn audit(&self) -> VerifyResult<AuditReport> {
        let report = AuditReport {
            versions: self.verify_all()?,
            ledger: self.verify_ledger()?,
        };
        if !report.is_clean() {
            warn!(
                drifted = report.drifted().count(),
                ledger_violations = report.ledger.violations.len(),
                "audit found integrity problems"
            );
        }
        Ok(report)
    }

    fn check(&self, version: &DocumentVersion) -> VerifyResult<VerificationResult> {
        let expected = version.content_hash;

        let computed = match self.store.get(&expected) {
            Ok(bytes) => Some(ContentHasher::BLOB.hash(&bytes)),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let ledger_status = self.ledger.verify(&expected)?;

        let drift = match computed {
            None => Some(DriftReason::ContentMissing),
            Some(hash) if hash != expected => Some(DriftReason::HashMismatch),
            Some(_) if !ledger_status.is_confirmed() => Some(DriftReason::Unanchored),
            Some(_) => self.anchor_drift(version)?,
        };

        let result = VerificationResult {
            document_id: version.document_id,
            version_id: version.version_id,
            content_hash: computed,
            expected_hash: expected,
            ledger_status,
            matches: drift.is_none(),
            drift,
        };
        match &result.drift {
            None => debug!(version = %version.version_ref(), "verified"),
            Some(reason) => warn!(version = %version.version_ref(), %reason, "verification failed"),
        }
        Ok(result)
    }

    /// Compare the version against the anchor it was published with.
    fn anchor_drift(&self, version: &DocumentVersion) -> VerifyResult<Option<DriftReason>> {
        let Some(sequence) = version.anchor_sequence else {
            return Ok(Some(DriftReason::Unanchored));
        };
        let drift = match self.ledger.record(sequence)? {
            Some(record) if !record.is_confirmed() => Some(DriftReason::Unanchored),
            Some(record)
                if record.content_hash != version.content_hash
                    || record.version != version.version_ref() =>
            {
                Some(DriftReason::AnchorMismatch {
                    anchored_hash: record.content_hash,
                })
            }
            Some(_) => None,
            None => Some(DriftReason::Unanchored),
        };
        Ok(drift)
    }
}
