use docseal_ledger::LedgerStatus;
use docseal_registry::{Document, DocumentVersion};
use docseal_types::{ContentHash, DocumentId, Timestamp, VersionId};
use serde::Serialize;

/// A document as callers see it: head metadata plus its current version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    pub document_id: DocumentId,
    pub title: String,
    pub description: String,
    pub created_at: Timestamp,
    pub current_version_id: VersionId,
    pub content_hash: ContentHash,
    pub ledger_status: LedgerStatus,
    pub size: u64,
    pub mime_type: String,
}

impl DocumentView {
    pub(crate) fn new(doc: &Document, current: &DocumentVersion, ledger_status: LedgerStatus) -> Self {
        Self {
            document_id: doc.document_id,
            title: doc.title.clone(),
            description: doc.description.clone(),
            created_at: doc.created_at,
            current_version_id: doc.current_version_id,
            content_hash: current.content_hash,
            ledger_status,
            size: current.size,
            mime_type: current.mime_type.clone(),
        }
    }
}

/// A document with its full version history.
#[derive(Clone, Debug, Serialize)]
pub struct DocumentDetails {
    #[serde(flatten)]
    pub document: DocumentView,
    pub deleted_at: Option<Timestamp>,
    /// Oldest first.
    pub versions: Vec<DocumentVersion>,
}

/// Search and listing row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub document_id: DocumentId,
    pub title: String,
    pub description: String,
    pub created_at: Timestamp,
    pub size: u64,
    pub mime_type: String,
    pub ledger_status: LedgerStatus,
}

impl From<DocumentView> for DocumentSummary {
    fn from(view: DocumentView) -> Self {
        Self {
            document_id: view.document_id,
            title: view.title,
            description: view.description,
            created_at: view.created_at,
            size: view.size,
            mime_type: view.mime_type,
            ledger_status: view.ledger_status,
        }
    }
}

/// Acknowledgement of a delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub document_id: DocumentId,
    pub deleted_at: Timestamp,
}
