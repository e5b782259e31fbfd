use docseal_crypto::ContentHasher;
use docseal_types::{ContentHash, DocumentId, Timestamp, VersionId, VersionRef};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// A document's identity and its current metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: DocumentId,
    pub title: String,
    pub description: String,
    /// Always the latest published version.
    pub current_version_id: VersionId,
    pub created_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Document {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn current(&self) -> VersionRef {
        VersionRef::new(self.document_id, self.current_version_id)
    }
}

/// One immutable version in a document's lineage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub version_id: VersionId,
    pub document_id: DocumentId,
    pub content_hash: ContentHash,
    pub size: u64,
    pub mime_type: String,
    pub created_at: Timestamp,
    pub created_by: String,
    pub title: String,
    pub description: String,
    /// Ledger sequence of the confirmed anchor. `None` while staged.
    pub anchor_sequence: Option<u64>,
}

impl DocumentVersion {
    pub fn version_ref(&self) -> VersionRef {
        VersionRef::new(self.document_id, self.version_id)
    }
}

/// Stored content a version points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentRef {
    pub content_hash: ContentHash,
    pub size: u64,
    pub mime_type: String,
}

/// Input for staging the first version of a new document.
#[derive(Clone, Debug)]
pub struct NewVersion {
    pub title: String,
    pub description: String,
    pub content: ContentRef,
    pub created_by: String,
}

/// Input for staging a follow-up version. `None` fields carry over from
/// the current version.
#[derive(Clone, Debug, Default)]
pub struct VersionChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<ContentRef>,
    pub created_by: String,
}

impl VersionChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.content.is_none()
    }
}

/// The persisted form of a document: its head plus every published version
/// in ascending order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document: Document,
    pub versions: Vec<DocumentVersion>,
}

impl DocumentRecord {
    /// Canonical JSON encoding. Field order follows the struct definitions,
    /// so equal records always encode to equal bytes.
    pub fn to_canonical_json(&self) -> RegistryResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| RegistryError::Serialization(e.to_string()))
    }

    /// Domain-separated hash of the canonical encoding.
    pub fn digest(&self) -> RegistryResult<ContentHash> {
        Ok(ContentHasher::RECORD.hash(&self.to_canonical_json()?))
    }

    pub fn current_version(&self) -> Option<&DocumentVersion> {
        self.version(self.document.current_version_id)
    }

    pub fn version(&self, version_id: VersionId) -> Option<&DocumentVersion> {
        self.versions.iter().find(|v| v.version_id == version_id)
    }

    /// Check the record's internal consistency after decoding.
    pub fn check(&self) -> Result<(), String> {
        let id = self.document.document_id;
        if let Some(v) = self.versions.iter().find(|v| v.document_id != id) {
            return Err(format!("version {} belongs to {}", v.version_id, v.document_id));
        }
        for (index, v) in self.versions.iter().enumerate() {
            if v.version_id.get() != index as u64 + 1 {
                return Err(format!("version lineage gap at {}", v.version_id));
            }
        }
        let current = self.document.current_version_id;
        match self.versions.last() {
            None => return Err(format!("current version {current} missing")),
            Some(last) if last.version_id != current => {
                return Err(format!(
                    "current version {current} is not the latest ({})",
                    last.version_id
                ));
            }
            Some(_) => {}
        }
        Ok(())
    }
}
