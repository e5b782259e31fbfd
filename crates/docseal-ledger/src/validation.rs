use std::collections::HashSet;

use docseal_crypto::{ChainLink, HashChainVerifier};
use serde::Serialize;

use crate::record::{AnchorRecord, AnchorStatus};

/// Result of a whole-ledger integrity walk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub record_count: u64,
    pub confirmed: u64,
    pub failed: u64,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if no violation was found.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation found during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub sequence: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    SequenceGap,
    DuplicateSequence,
    HashChainBreak,
    HashMismatch,
    /// A `Pending` record survived outside an in-flight append.
    StrandedPending,
}

/// Ledger integrity validator.
pub struct LedgerValidator;

impl LedgerValidator {
    /// Check sequence continuity, chain links and record hashes.
    pub fn validate(records: &[AnchorRecord]) -> ValidationReport {
        let mut report = ValidationReport {
            record_count: records.len() as u64,
            ..Default::default()
        };
        let mut seen = HashSet::new();

        for (index, record) in records.iter().enumerate() {
            let expected_seq = index as u64 + 1;
            if !seen.insert(record.sequence) {
                report.violations.push(Violation {
                    sequence: record.sequence,
                    kind: ViolationKind::DuplicateSequence,
                    description: format!("sequence {} appears more than once", record.sequence),
                });
            } else if record.sequence != expected_seq {
                report.violations.push(Violation {
                    sequence: record.sequence,
                    kind: ViolationKind::SequenceGap,
                    description: format!("expected seq {expected_seq}, got {}", record.sequence),
                });
            }

            let expected_prev = index.checked_sub(1).map(|i| records[i].link_hash());
            if record.prev_hash() != expected_prev {
                report.violations.push(Violation {
                    sequence: record.sequence,
                    kind: ViolationKind::HashChainBreak,
                    description: "previous hash link mismatch".into(),
                });
            }

            let computed = HashChainVerifier::compute_hash(&record.payload_bytes(), record.prev_hash);
            if computed != record.record_hash {
                report.violations.push(Violation {
                    sequence: record.sequence,
                    kind: ViolationKind::HashMismatch,
                    description: "record hash does not match computed".into(),
                });
            }

            match record.status {
                AnchorStatus::Confirmed => report.confirmed += 1,
                AnchorStatus::Failed => report.failed += 1,
                AnchorStatus::Pending => report.violations.push(Violation {
                    sequence: record.sequence,
                    kind: ViolationKind::StrandedPending,
                    description: "record never reached a terminal status".into(),
                }),
            }
        }

        report
    }
}
