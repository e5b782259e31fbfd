use std::fmt;

use docseal_crypto::{ChainLink, HashChainVerifier};
use docseal_types::{ContentHash, Timestamp, VersionRef};
use serde::{Deserialize, Serialize};

/// Lifecycle of a single anchor record.
///
/// `Pending` exists only while the journal write is in flight. `Confirmed`
/// and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorStatus {
    Pending,
    Confirmed,
    Failed,
}

impl fmt::Display for AnchorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Ledger answer to "is this content hash anchored?".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerStatus {
    /// At least one `Confirmed` record commits this hash.
    Confirmed,
    /// No confirmed record exists for this hash.
    Unanchored,
}

impl LedgerStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => write!(f, "confirmed"),
            Self::Unanchored => write!(f, "unanchored"),
        }
    }
}

/// A content hash committed to the ledger at a fixed sequence position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// Position in the ledger, starting at 1, gap-free.
    pub sequence: u64,
    /// The anchored content hash.
    pub content_hash: ContentHash,
    /// The document version this anchor was created for.
    pub version: VersionRef,
    pub anchored_at: Timestamp,
    pub status: AnchorStatus,
    /// Hash of the preceding record (None for sequence 1).
    pub prev_hash: Option<ContentHash>,
    /// Chain hash over `prev_hash` and this record's canonical body.
    pub record_hash: ContentHash,
}

/// Canonical body covered by `record_hash`. Field order is the encoding order.
#[derive(Serialize)]
struct AnchorBody<'a> {
    sequence: u64,
    content_hash: &'a ContentHash,
    version: &'a VersionRef,
    anchored_at: &'a Timestamp,
    status: AnchorStatus,
}

impl AnchorRecord {
    /// Build a `Pending` record chained onto `prev_hash`.
    pub fn pending(
        sequence: u64,
        content_hash: ContentHash,
        version: VersionRef,
        anchored_at: Timestamp,
        prev_hash: Option<ContentHash>,
    ) -> Self {
        let mut record = Self {
            sequence,
            content_hash,
            version,
            anchored_at,
            status: AnchorStatus::Pending,
            prev_hash,
            record_hash: ContentHash::null(),
        };
        record.record_hash = record.compute_hash();
        record
    }

    /// Copy of this record moved to a terminal status, with its hash resealed.
    ///
    /// Only `Pending` records may be sealed; sealing a terminal record is a
    /// programming error and returns the record unchanged.
    pub fn sealed(&self, status: AnchorStatus) -> Self {
        if self.status != AnchorStatus::Pending {
            debug_assert!(false, "attempted to reseal a terminal anchor record");
            return self.clone();
        }
        let mut record = self.clone();
        record.status = status;
        record.record_hash = record.compute_hash();
        record
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == AnchorStatus::Confirmed
    }

    /// Recompute the chain hash from this record's fields.
    pub fn compute_hash(&self) -> ContentHash {
        HashChainVerifier::compute_hash(&self.payload_bytes(), self.prev_hash)
    }

    fn canonical_body(&self) -> Vec<u8> {
        let body = AnchorBody {
            sequence: self.sequence,
            content_hash: &self.content_hash,
            version: &self.version,
            anchored_at: &self.anchored_at,
            status: self.status,
        };
        // Serializing plain fields into a Vec cannot fail.
        serde_json::to_vec(&body).unwrap_or_default()
    }
}

impl ChainLink for AnchorRecord {
    fn link_hash(&self) -> ContentHash {
        self.record_hash
    }

    fn prev_hash(&self) -> Option<ContentHash> {
        self.prev_hash
    }

    fn payload_bytes(&self) -> Vec<u8> {
        self.canonical_body()
    }
}
