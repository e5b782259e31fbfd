use std::sync::Arc;

use docseal_index::SearchIndex;
use docseal_ledger::{
    AnchorRecord, FileLedger, InMemoryLedger, IntegrityLedger, LedgerStatus,
};
use docseal_lifecycle::{Committed, DocumentChanges, LifecycleCoordinator, NewDocument};
use docseal_registry::{Document, DocumentRegistry, FileRegistry, InMemoryRegistry};
use docseal_store::{ContentStore, FsContentStore, InMemoryContentStore};
use docseal_types::{ContentHash, DocumentId, VersionId};
use docseal_verify::{AuditReport, VerificationResult, VerificationService};
use tracing::{info, warn};

use crate::config::{DocSealConfig, StorageBackend};
use crate::error::{SdkError, SdkResult};
use crate::views::{Ack, DocumentDetails, DocumentSummary, DocumentView};

/// High-level DocSeal API.
pub struct DocSeal {
    config: DocSealConfig,
    store: Arc<dyn ContentStore>,
    registry: Arc<dyn DocumentRegistry>,
    ledger: Arc<dyn IntegrityLedger>,
    index: Arc<SearchIndex>,
    coordinator: LifecycleCoordinator,
    verifier: VerificationService,
}

impl DocSeal {
    /// Open the backends named by `config` and rebuild the search index.
    pub fn open(config: DocSealConfig) -> SdkResult<Self> {
        let store: Arc<dyn ContentStore>;
        let registry: Arc<dyn DocumentRegistry>;
        let ledger: Arc<dyn IntegrityLedger>;
        match config.storage.backend {
            StorageBackend::Memory => {
                store = Arc::new(InMemoryContentStore::new());
                registry = Arc::new(InMemoryRegistry::default());
                ledger = Arc::new(InMemoryLedger::default());
            }
            StorageBackend::Fs => {
                let root = &config.storage.root;
                store = Arc::new(FsContentStore::open(root.clone())?);
                registry = Arc::new(FileRegistry::open_dir(root)?);
                let file_ledger = FileLedger::open_file(&config.ledger_path())?;
                if let Some(reason) = file_ledger.halted()? {
                    warn!(%reason, "ledger is halted; anchoring disabled until repaired");
                }
                ledger = Arc::new(file_ledger);
            }
        }

        let index = Arc::new(SearchIndex::new());
        let indexed = index.rebuild(&registry.list(false)?)?;

        let coordinator = LifecycleCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&ledger),
            Arc::clone(&index),
        )
        .with_config(config.lifecycle.clone())
        .with_retry(config.retry.clone());
        let verifier = VerificationService::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&ledger),
        );

        info!(
            backend = ?config.storage.backend,
            root = %config.storage.root.display(),
            documents = indexed,
            "docseal opened"
        );
        Ok(Self {
            config,
            store,
            registry,
            ledger,
            index,
            coordinator,
            verifier,
        })
    }

    /// An instance backed entirely by memory.
    pub fn in_memory() -> SdkResult<Self> {
        Self::open(DocSealConfig::in_memory())
    }

    pub fn config(&self) -> &DocSealConfig {
        &self.config
    }

    // ---- Write operations ----

    pub async fn create_document(&self, request: NewDocument) -> SdkResult<DocumentView> {
        let committed = self.coordinator.create(request).await?;
        Ok(committed_view(&committed))
    }

    pub async fn update_document(
        &self,
        document: &DocumentId,
        expected: VersionId,
        changes: DocumentChanges,
    ) -> SdkResult<DocumentView> {
        let committed = self.coordinator.update(document, expected, changes).await?;
        Ok(committed_view(&committed))
    }

    pub async fn delete_document(&self, document: &DocumentId, expected: VersionId) -> SdkResult<Ack> {
        let deleted = self.coordinator.delete(document, expected).await?;
        let deleted_at = deleted
            .deleted_at
            .ok_or_else(|| SdkError::Internal("delete returned a live document".into()))?;
        Ok(Ack {
            document_id: deleted.document_id,
            deleted_at,
        })
    }

    // ---- Read operations ----

    pub fn get_document(&self, document: &DocumentId, include_deleted: bool) -> SdkResult<DocumentDetails> {
        let doc = self.registry.get(document, include_deleted)?;
        Ok(DocumentDetails {
            document: self.view(&doc)?,
            deleted_at: doc.deleted_at,
            versions: self.registry.versions(document, include_deleted)?,
        })
    }

    /// Active documents, oldest first.
    pub fn list_documents(&self) -> SdkResult<Vec<DocumentSummary>> {
        self.registry
            .list_active()?
            .iter()
            .map(|doc| self.view(doc).map(DocumentSummary::from))
            .collect()
    }

    /// Case-insensitive phrase search over titles and descriptions. A blank term
    /// lists every active document.
    pub fn search_documents(&self, term: &str) -> SdkResult<Vec<DocumentSummary>> {
        let mut results = Vec::new();
        for id in self.index.query(term)? {
            match self.registry.get(&id, false) {
                Ok(doc) => results.push(DocumentSummary::from(self.view(&doc)?)),
                // Raced with a delete or a rolled-back create.
                Err(docseal_registry::RegistryError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(results)
    }

    /// Bytes of the current version, checked against their content hash.
    pub fn download_content(&self, document: &DocumentId) -> SdkResult<(Vec<u8>, ContentHash)> {
        let version = self.registry.current_version(document, false)?;
        let bytes = self.store.get_verified(&version.content_hash)?;
        Ok((bytes, version.content_hash))
    }

    /// Bytes of any published version, including versions of deleted
    /// documents.
    pub fn download_version(
        &self,
        document: &DocumentId,
        version: VersionId,
    ) -> SdkResult<(Vec<u8>, ContentHash)> {
        let version = self.registry.version(document, version)?;
        let bytes = self.store.get_verified(&version.content_hash)?;
        Ok((bytes, version.content_hash))
    }

    // ---- Integrity ----

    pub fn verify_document(&self, document: &DocumentId) -> SdkResult<VerificationResult> {
        Ok(self.verifier.verify_document(document)?)
    }

    pub fn verify_version(&self, document: &DocumentId, version: VersionId) -> SdkResult<VerificationResult> {
        Ok(self.verifier.verify_version(document, version)?)
    }

    /// The most recent `limit` ledger records, newest first.
    pub fn ledger_log(&self, limit: usize) -> SdkResult<Vec<AnchorRecord>> {
        let records = self.ledger.records()?;
        Ok(records.into_iter().rev().take(limit).collect())
    }

    /// Verify every version of every document and validate the ledger.
    pub fn audit(&self) -> SdkResult<AuditReport> {
        Ok(self.verifier.audit()?)
    }

    fn view(&self, doc: &Document) -> SdkResult<DocumentView> {
        let current = self.registry.version(&doc.document_id, doc.current_version_id)?;
        let status = self.ledger.verify(&current.content_hash)?;
        Ok(DocumentView::new(doc, &current, status))
    }
}

fn committed_view(committed: &Committed) -> DocumentView {
    let status = if committed.anchor.is_confirmed() {
        LedgerStatus::Confirmed
    } else {
        LedgerStatus::Unanchored
    };
    DocumentView::new(&committed.document, &committed.version, status)
}

impl std::fmt::Debug for DocSeal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocSeal")
            .field("backend", &self.config.storage.backend)
            .field("root", &self.config.storage.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_verify::DriftReason;

    fn report_q1(bytes: &[u8]) -> NewDocument {
        NewDocument {
            title: "Report Q1".into(),
            description: "First quarter results".into(),
            content: bytes.to_vec(),
            mime_type: Some("application/pdf".into()),
            created_by: Some("alice".into()),
        }
    }

    #[tokio::test]
    async fn report_q1_lifecycle() {
        let seal = DocSeal::in_memory().unwrap();
        let v1 = seal.create_document(report_q1(b"bytes A")).await.unwrap();
        assert_eq!(v1.current_version_id, VersionId::INITIAL);
        assert_eq!(v1.ledger_status, LedgerStatus::Confirmed);
        assert_eq!(v1.size, 7);

        let id = v1.document_id;
        let v2 = seal
            .update_document(
                &id,
                VersionId::INITIAL,
                DocumentChanges {
                    content: Some(b"bytes B".to_vec()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(v2.current_version_id, VersionId::new(2));
        assert_eq!(v2.mime_type, "application/pdf");

        let (old, old_hash) = seal.download_version(&id, VersionId::INITIAL).unwrap();
        assert_eq!(old, b"bytes A");
        assert_eq!(old_hash, v1.content_hash);
        let (current, _) = seal.download_content(&id).unwrap();
        assert_eq!(current, b"bytes B");

        let result = seal.verify_document(&id).unwrap();
        assert!(result.matches);
        assert_eq!(result.version_id, VersionId::new(2));

        let details = seal.get_document(&id, false).unwrap();
        assert_eq!(details.versions.len(), 2);
        assert_eq!(details.document, v2);
    }

    #[tokio::test]
    async fn fs_corruption_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let seal = DocSeal::open(DocSealConfig::at_root(dir.path())).unwrap();
        let view = seal.create_document(report_q1(b"bytes A")).await.unwrap();

        let blob = FsContentStore::open(dir.path())
            .unwrap()
            .blob_path(&view.content_hash);
        std::fs::write(blob, b"bytes A, edited out of band").unwrap();

        let result = seal.verify_document(&view.document_id).unwrap();
        assert!(!result.matches);
        assert_eq!(result.drift, Some(DriftReason::HashMismatch));

        let err = seal.download_content(&view.document_id).unwrap_err();
        assert!(matches!(err, SdkError::HashMismatch { expected, .. } if expected == view.content_hash));

        let audit = seal.audit().unwrap();
        assert!(!audit.is_clean());
        assert!(audit.ledger.is_valid());
    }

    #[tokio::test]
    async fn delete_hides_from_search_but_keeps_history() {
        let seal = DocSeal::in_memory().unwrap();
        let view = seal.create_document(report_q1(b"bytes A")).await.unwrap();
        let id = view.document_id;
        assert_eq!(seal.search_documents("report").unwrap().len(), 1);

        let ack = seal.delete_document(&id, VersionId::INITIAL).await.unwrap();
        assert_eq!(ack.document_id, id);

        assert!(seal.search_documents("report").unwrap().is_empty());
        assert!(seal.list_documents().unwrap().is_empty());
        assert!(matches!(seal.get_document(&id, false), Err(SdkError::NotFound(_))));
        assert!(matches!(seal.download_content(&id), Err(SdkError::NotFound(_))));

        let details = seal.get_document(&id, true).unwrap();
        assert_eq!(details.deleted_at, Some(ack.deleted_at));
        assert_eq!(details.versions.len(), 1);
        assert!(seal.download_version(&id, VersionId::INITIAL).is_ok());
    }

    #[tokio::test]
    async fn search_matches_title_and_description() {
        let seal = DocSeal::in_memory().unwrap();
        seal.create_document(report_q1(b"a")).await.unwrap();
        seal.create_document(NewDocument {
            title: "Invoice 442".into(),
            description: "Supplier payment".into(),
            content: b"b".to_vec(),
            ..Default::default()
        })
        .await
        .unwrap();

        let hits = seal.search_documents("QUARTER").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Report Q1");
        assert_eq!(hits[0].ledger_status, LedgerStatus::Confirmed);
        assert_eq!(seal.search_documents("").unwrap().len(), 2);
        assert!(seal.search_documents("contract").unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_update_maps_to_concurrent_modification() {
        let seal = DocSeal::in_memory().unwrap();
        let id = seal.create_document(report_q1(b"a")).await.unwrap().document_id;
        let changes = DocumentChanges {
            description: Some("revised".into()),
            ..Default::default()
        };
        seal.update_document(&id, VersionId::INITIAL, changes.clone())
            .await
            .unwrap();
        let err = seal
            .update_document(&id, VersionId::INITIAL, changes)
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::ConcurrentModification { .. }));
    }

    #[tokio::test]
    async fn validation_errors_surface_unchanged() {
        let seal = DocSeal::in_memory().unwrap();
        let err = seal.create_document(report_q1(b"")).await.unwrap_err();
        assert!(matches!(err, SdkError::Validation(_)));
        assert!(matches!(
            seal.get_document(&DocumentId::new(), true),
            Err(SdkError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn ledger_log_is_newest_first() {
        let seal = DocSeal::in_memory().unwrap();
        for i in 0..3u8 {
            seal.create_document(report_q1(&[i + 1])).await.unwrap();
        }
        let log = seal.ledger_log(2).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].sequence, 3);
        assert_eq!(log[1].sequence, 2);
    }

    #[tokio::test]
    async fn fs_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = DocSealConfig::at_root(dir.path());
        let (id, hash) = {
            let seal = DocSeal::open(config.clone()).unwrap();
            let v = seal.create_document(report_q1(b"durable bytes")).await.unwrap();
            (v.document_id, v.content_hash)
        };

        let seal = DocSeal::open(config).unwrap();
        let hits = seal.search_documents("report").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_id, id);

        let result = seal.verify_document(&id).unwrap();
        assert!(result.matches);
        assert_eq!(result.expected_hash, hash);

        let v2 = seal
            .update_document(
                &id,
                VersionId::INITIAL,
                DocumentChanges {
                    content: Some(b"second".to_vec()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(v2.current_version_id, VersionId::new(2));
        assert!(seal.audit().unwrap().is_clean());
        assert_eq!(seal.ledger_log(10).unwrap().len(), 2);
    }
}
