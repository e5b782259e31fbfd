use std::sync::Arc;

use docseal_index::SearchIndex;
use docseal_ledger::{AnchorRecord, IntegrityLedger, LedgerError};
use docseal_registry::{
    ContentRef, Document, DocumentRegistry, DocumentVersion, NewVersion, VersionChanges,
};
use docseal_store::ContentStore;
use docseal_types::{ContentHash, DocumentId, VersionId, VersionRef};
use tracing::{debug, info, warn};

use crate::config::LifecycleConfig;
use crate::error::{LifecycleError, LifecycleResult};
use crate::locks::DocumentLocks;
use crate::retry::RetryPolicy;
use crate::state::{LifecycleEvent, LifecycleState};

/// Request to create a document.
#[derive(Clone, Debug, Default)]
pub struct NewDocument {
    pub title: String,
    pub description: String,
    pub content: Vec<u8>,
    pub mime_type: Option<String>,
    pub created_by: Option<String>,
}

/// Request to update a document. `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct DocumentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<Vec<u8>>,
    pub mime_type: Option<String>,
    pub updated_by: Option<String>,
}

impl DocumentChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.content.is_none()
            && self.mime_type.is_none()
    }
}

/// A published version and the anchor that confirmed it.
#[derive(Clone, Debug)]
pub struct Committed {
    pub document: Document,
    pub version: DocumentVersion,
    pub anchor: AnchorRecord,
}

/// Tracks one operation through [`LifecycleState`].
struct Operation {
    kind: &'static str,
    document: Option<DocumentId>,
    state: LifecycleState,
}

impl Operation {
    fn new(kind: &'static str, document: Option<DocumentId>, state: LifecycleState) -> Self {
        Self {
            kind,
            document,
            state,
        }
    }

    fn advance(&mut self, event: LifecycleEvent) -> LifecycleResult<()> {
        let next = self.state.transition(event)?;
        debug!(
            op = self.kind,
            document = ?self.document,
            from = %self.state,
            to = %next,
            "lifecycle transition"
        );
        self.state = next;
        Ok(())
    }

    /// Move to `Failed` and hand back `err`.
    fn fail(&mut self, err: LifecycleError) -> LifecycleError {
        warn!(op = self.kind, document = ?self.document, state = %self.state, error = %err, "operation failed");
        if let Ok(next) = self.state.transition(LifecycleEvent::Failed) {
            self.state = next;
        }
        err
    }
}

/// Discards a staged version unless disarmed. Covers both explicit failure
/// and a dropped (cancelled) future.
struct StagedGuard<'a> {
    registry: &'a dyn DocumentRegistry,
    staged: Option<VersionRef>,
}

impl<'a> StagedGuard<'a> {
    fn new(registry: &'a dyn DocumentRegistry, staged: VersionRef) -> Self {
        Self {
            registry,
            staged: Some(staged),
        }
    }

    fn disarm(&mut self) {
        self.staged = None;
    }
}

impl Drop for StagedGuard<'_> {
    fn drop(&mut self) {
        let Some(staged) = self.staged.take() else {
            return;
        };
        match self.registry.discard(&staged.document_id, staged.version_id) {
            Ok(_) => debug!(version = %staged, "staged version discarded"),
            Err(e) => warn!(version = %staged, error = %e, "failed to discard staged version"),
        }
    }
}

/// Orchestrates create, update and delete across the store, registry,
/// ledger and search index.
pub struct LifecycleCoordinator {
    store: Arc<dyn ContentStore>,
    registry: Arc<dyn DocumentRegistry>,
    ledger: Arc<dyn IntegrityLedger>,
    index: Arc<SearchIndex>,
    locks: DocumentLocks,
    config: LifecycleConfig,
    retry: RetryPolicy,
}

impl LifecycleCoordinator {
    pub fn new(
        store: Arc<dyn ContentStore>,
        registry: Arc<dyn DocumentRegistry>,
        ledger: Arc<dyn IntegrityLedger>,
        index: Arc<SearchIndex>,
    ) -> Self {
        let config = LifecycleConfig::default();
        Self {
            store,
            registry,
            ledger,
            index,
            locks: DocumentLocks::new(config.lock_timeout()),
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.locks = DocumentLocks::new(config.lock_timeout());
        self.config = config;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn locks(&self) -> &DocumentLocks {
        &self.locks
    }

    /// Create a document and publish version 1.
    pub async fn create(&self, request: NewDocument) -> LifecycleResult<Committed> {
        validate_title(&request.title)?;
        validate_content(&request.content)?;

        let mut op = Operation::new("create", None, LifecycleState::Draft);
        let content_hash = self.put(&request.content).await.map_err(|e| op.fail(e))?;

        let staged = self
            .registry
            .create(NewVersion {
                title: request.title,
                description: request.description,
                content: ContentRef {
                    content_hash,
                    size: request.content.len() as u64,
                    mime_type: request
                        .mime_type
                        .unwrap_or_else(|| self.config.default_mime_type.clone()),
                },
                created_by: request
                    .created_by
                    .unwrap_or_else(|| self.config.default_author.clone()),
            })
            .map_err(|e| op.fail(e.into()))?;
        op.document = Some(staged.document_id);

        let prospective = Document {
            document_id: staged.document_id,
            title: staged.title.clone(),
            description: staged.description.clone(),
            current_version_id: staged.version_id,
            created_at: staged.created_at,
            deleted_at: None,
        };
        self.commit(op, staged, prospective, None).await
    }

    /// Publish a new version of `document` if `expected` is still current.
    pub async fn update(
        &self,
        document: &DocumentId,
        expected: VersionId,
        changes: DocumentChanges,
    ) -> LifecycleResult<Committed> {
        if changes.is_empty() {
            return Err(LifecycleError::Validation("no changes supplied".into()));
        }
        if let Some(title) = &changes.title {
            validate_title(title)?;
        }
        if let Some(content) = &changes.content {
            validate_content(content)?;
        }

        let _lock = self.locks.acquire(document).await?;
        let previous = self.registry.get(document, false)?;
        if previous.current_version_id != expected {
            return Err(LifecycleError::ConcurrentModification {
                document: *document,
                expected,
                current: previous.current_version_id,
            });
        }

        let mut op = Operation::new("update", Some(*document), LifecycleState::Draft);
        let content = match (&changes.content, changes.mime_type) {
            (Some(bytes), mime_type) => {
                let content_hash = self.put(bytes).await.map_err(|e| op.fail(e))?;
                let mime_type = match mime_type {
                    Some(m) => m,
                    None => self.registry.version(document, expected)?.mime_type,
                };
                Some(ContentRef {
                    content_hash,
                    size: bytes.len() as u64,
                    mime_type,
                })
            }
            (None, Some(mime_type)) => {
                let current = self.registry.version(document, expected)?;
                Some(ContentRef {
                    content_hash: current.content_hash,
                    size: current.size,
                    mime_type,
                })
            }
            (None, None) => None,
        };

        let staged = self
            .registry
            .create_version(
                document,
                expected,
                VersionChanges {
                    title: changes.title,
                    description: changes.description,
                    content,
                    created_by: changes
                        .updated_by
                        .unwrap_or_else(|| self.config.default_author.clone()),
                },
            )
            .map_err(|e| op.fail(e.into()))?;

        let prospective = Document {
            title: staged.title.clone(),
            description: staged.description.clone(),
            current_version_id: staged.version_id,
            ..previous.clone()
        };
        self.commit(op, staged, prospective, Some(previous)).await
    }

    /// Soft-delete `document` if `expected` is still current.
    pub async fn delete(&self, document: &DocumentId, expected: VersionId) -> LifecycleResult<Document> {
        let _lock = self.locks.acquire(document).await?;
        let mut op = Operation::new("delete", Some(*document), LifecycleState::Active);

        let deleted = self.registry.soft_delete(document, expected)?;
        self.index.remove(document)?;
        op.advance(LifecycleEvent::Deleted)?;
        info!(document = %document, "document deleted");
        Ok(deleted)
    }

    /// Anchor, index and publish a staged version. `previous` is the
    /// document as readers saw it before this operation, if it existed.
    async fn commit(
        &self,
        mut op: Operation,
        staged: DocumentVersion,
        prospective: Document,
        previous: Option<Document>,
    ) -> LifecycleResult<Committed> {
        let mut guard = StagedGuard::new(self.registry.as_ref(), staged.version_ref());
        op.advance(LifecycleEvent::Stored)?;

        let anchor = self
            .anchor(staged.content_hash, staged.version_ref())
            .await
            .map_err(|e| op.fail(e))?;
        op.advance(LifecycleEvent::Anchored)?;

        self.index.index(&prospective).map_err(|e| op.fail(e.into()))?;

        let document = match self
            .registry
            .publish(&staged.document_id, staged.version_id, anchor.sequence)
        {
            Ok(document) => document,
            Err(e) => {
                self.restore_index(&prospective.document_id, previous.as_ref());
                return Err(op.fail(e.into()));
            }
        };
        guard.disarm();
        op.advance(LifecycleEvent::Published)?;

        let mut version = staged;
        version.anchor_sequence = Some(anchor.sequence);
        info!(
            op = op.kind,
            version = %version.version_ref(),
            hash = %version.content_hash.short_hex(),
            anchor = anchor.sequence,
            "version active"
        );
        Ok(Committed {
            document,
            version,
            anchor,
        })
    }

    async fn put(&self, bytes: &[u8]) -> LifecycleResult<ContentHash> {
        self.retry
            .run("store.put", || self.store.put(bytes), |e| e.is_transient())
            .await
            .map_err(|exhausted| match exhausted.error {
                e if e.is_transient() => LifecycleError::StorageUnavailable(format!(
                    "{e} (after {} attempts)",
                    exhausted.attempts
                )),
                e => e.into(),
            })
    }

    /// Each attempt is a fresh anchor with its own sequence.
    async fn anchor(&self, hash: ContentHash, version: VersionRef) -> LifecycleResult<AnchorRecord> {
        self.retry
            .run(
                "ledger.anchor",
                || self.ledger.anchor(hash, version),
                |e| matches!(e, LedgerError::AnchorFailure { .. } | LedgerError::Io(_)),
            )
            .await
            .map_err(|exhausted| match exhausted.error {
                LedgerError::AnchorFailure { reason, .. } | LedgerError::Io(reason) => {
                    LifecycleError::AnchorFailure {
                        attempts: exhausted.attempts,
                        reason,
                    }
                }
                e => e.into(),
            })
    }

    fn restore_index(&self, document: &DocumentId, previous: Option<&Document>) {
        let restored = match previous {
            Some(doc) => self.index.index(doc),
            None => self.index.remove(document).map(|_| ()),
        };
        if let Err(e) = restored {
            warn!(document = %document, error = %e, "failed to restore search index");
        }
    }
}

fn validate_title(title: &str) -> LifecycleResult<()> {
    if title.trim().is_empty() {
        return Err(LifecycleError::Validation("title is required".into()));
    }
    Ok(())
}

fn validate_content(content: &[u8]) -> LifecycleResult<()> {
    if content.is_empty() {
        return Err(LifecycleError::Validation("content must not be empty".into()));
    }
    Ok(())
}
