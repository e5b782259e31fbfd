use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use docseal_types::{now, DocumentId, VersionId};
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::persist::{FileRecords, MemoryRecords, RecordStore};
use crate::traits::DocumentRegistry;
use crate::types::{Document, DocumentRecord, DocumentVersion, NewVersion, VersionChanges};

/// Registry with records held only in memory.
pub type InMemoryRegistry = Registry<MemoryRecords>;

/// Registry persisting one JSON record per document.
pub type FileRegistry = Registry<FileRecords>;

/// Per-document catalog entry.
#[derive(Debug, Default)]
struct Entry {
    /// The published record. `None` until the first publish.
    record: Option<DocumentRecord>,
    /// At most one staged version per document.
    staged: Option<DocumentVersion>,
}

impl Entry {
    fn is_vacant(&self) -> bool {
        self.record.is_none() && self.staged.is_none()
    }

    fn visible(&self, include_deleted: bool) -> Option<&DocumentRecord> {
        self.record
            .as_ref()
            .filter(|r| include_deleted || !r.document.is_deleted())
    }
}

type Shared<T> = Arc<RwLock<T>>;

/// The document registry over a [`RecordStore`].
///
/// Each document has its own lock. The outer map lock is only held to find
/// or insert an entry and never while waiting on an entry lock, so writes to
/// different documents do not serialize on each other.
pub struct Registry<S: RecordStore> {
    store: S,
    entries: RwLock<HashMap<DocumentId, Shared<Entry>>>,
}

impl Registry<MemoryRecords> {
    pub fn in_memory() -> Self {
        Self {
            store: MemoryRecords::new(),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for Registry<MemoryRecords> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Registry<FileRecords> {
    /// Open (or create) a file-backed registry rooted at `root`.
    pub fn open_dir(root: impl AsRef<Path>) -> RegistryResult<Self> {
        Self::open(FileRecords::open(root)?)
    }
}

impl<S: RecordStore> Registry<S> {
    /// Build the catalog from every record in `store`.
    pub fn open(store: S) -> RegistryResult<Self> {
        let entries: HashMap<_, _> = store
            .load()?
            .into_iter()
            .map(|record| {
                let id = record.document.document_id;
                let entry = Entry {
                    record: Some(record),
                    staged: None,
                };
                (id, Arc::new(RwLock::new(entry)))
            })
            .collect();
        info!(documents = entries.len(), "registry opened");
        Ok(Self {
            store,
            entries: RwLock::new(entries),
        })
    }

    fn entry(&self, document: &DocumentId) -> RegistryResult<Shared<Entry>> {
        let entries = self.entries.read().map_err(|_| RegistryError::LockPoisoned)?;
        entries
            .get(document)
            .cloned()
            .ok_or(RegistryError::NotFound(*document))
    }

    /// Read-only access to a document's entry.
    fn read<T>(
        &self,
        document: &DocumentId,
        f: impl FnOnce(&Entry) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let entry = self.entry(document)?;
        let guard = entry.read().map_err(|_| RegistryError::LockPoisoned)?;
        f(&guard)
    }

    fn all_entries(&self) -> RegistryResult<Vec<Shared<Entry>>> {
        let entries = self.entries.read().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(entries.values().cloned().collect())
    }

    /// Drop an entry left with nothing published and nothing staged.
    fn remove_if_vacant(&self, document: &DocumentId) -> RegistryResult<()> {
        let mut entries = self.entries.write().map_err(|_| RegistryError::LockPoisoned)?;
        let vacant = match entries.get(document) {
            Some(entry) => entry
                .read()
                .map_err(|_| RegistryError::LockPoisoned)?
                .is_vacant(),
            None => false,
        };
        if vacant {
            entries.remove(document);
        }
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn require_title(title: &str) -> RegistryResult<()> {
    if title.trim().is_empty() {
        return Err(RegistryError::Validation("title must not be empty".into()));
    }
    Ok(())
}

impl<S: RecordStore> DocumentRegistry for Registry<S> {
    fn create(&self, new: NewVersion) -> RegistryResult<DocumentVersion> {
        require_title(&new.title)?;
        let document_id = DocumentId::new();
        let version = DocumentVersion {
            version_id: VersionId::INITIAL,
            document_id,
            content_hash: new.content.content_hash,
            size: new.content.size,
            mime_type: new.content.mime_type,
            created_at: now(),
            created_by: new.created_by,
            title: new.title,
            description: new.description,
            anchor_sequence: None,
        };

        let entry = Entry {
            record: None,
            staged: Some(version.clone()),
        };
        let mut entries = self.entries.write().map_err(|_| RegistryError::LockPoisoned)?;
        entries.insert(document_id, Arc::new(RwLock::new(entry)));
        debug!(document = %document_id, "document staged");
        Ok(version)
    }

    fn create_version(
        &self,
        document: &DocumentId,
        expected: VersionId,
        changes: VersionChanges,
    ) -> RegistryResult<DocumentVersion> {
        if let Some(title) = &changes.title {
            require_title(title)?;
        }

        let entry = self.entry(document)?;
        let mut guard = entry.write().map_err(|_| RegistryError::LockPoisoned)?;
        let record = guard
            .visible(false)
            .ok_or(RegistryError::NotFound(*document))?;
        let current_id = record.document.current_version_id;
        if expected != current_id || guard.staged.is_some() {
            return Err(RegistryError::ConcurrentModification {
                document: *document,
                expected,
                current: current_id,
            });
        }
        let current = record
            .current_version()
            .ok_or(RegistryError::VersionNotFound {
                document: *document,
                version: current_id,
            })?;

        let (content_hash, size, mime_type) = match changes.content {
            Some(content) => (content.content_hash, content.size, content.mime_type),
            None => (current.content_hash, current.size, current.mime_type.clone()),
        };
        let version = DocumentVersion {
            version_id: current_id.next(),
            document_id: *document,
            content_hash,
            size,
            mime_type,
            created_at: now(),
            created_by: changes.created_by,
            title: changes.title.unwrap_or_else(|| current.title.clone()),
            description: changes
                .description
                .unwrap_or_else(|| current.description.clone()),
            anchor_sequence: None,
        };

        guard.staged = Some(version.clone());
        debug!(document = %document, version = %version.version_id, "version staged");
        Ok(version)
    }

    fn publish(
        &self,
        document: &DocumentId,
        version: VersionId,
        anchor_sequence: u64,
    ) -> RegistryResult<Document> {
        let entry = self.entry(document)?;
        let mut guard = entry.write().map_err(|_| RegistryError::LockPoisoned)?;
        let staged = guard
            .staged
            .as_ref()
            .filter(|s| s.version_id == version)
            .ok_or(RegistryError::NotStaged {
                document: *document,
                version,
            })?;

        let mut published = staged.clone();
        published.anchor_sequence = Some(anchor_sequence);

        let mut record = match &guard.record {
            Some(existing) => existing.clone(),
            None => DocumentRecord {
                document: Document {
                    document_id: *document,
                    title: published.title.clone(),
                    description: published.description.clone(),
                    current_version_id: version,
                    created_at: published.created_at,
                    deleted_at: None,
                },
                versions: Vec::new(),
            },
        };
        record.document.title = published.title.clone();
        record.document.description = published.description.clone();
        record.document.current_version_id = version;
        record.versions.push(published);

        // Save before swapping in memory; on failure the version stays staged.
        self.store.save(&record)?;

        let doc = record.document.clone();
        guard.record = Some(record);
        guard.staged = None;
        info!(document = %document, version = %version, anchor = anchor_sequence, "version published");
        Ok(doc)
    }

    fn discard(&self, document: &DocumentId, version: VersionId) -> RegistryResult<bool> {
        let entry = match self.entry(document) {
            Ok(entry) => entry,
            Err(RegistryError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        let (discarded, vacant) = {
            let mut guard = entry.write().map_err(|_| RegistryError::LockPoisoned)?;
            let matches = guard
                .staged
                .as_ref()
                .is_some_and(|s| s.version_id == version);
            if matches {
                guard.staged = None;
            }
            (matches, guard.is_vacant())
        };

        if vacant {
            self.remove_if_vacant(document)?;
        }
        if discarded {
            debug!(document = %document, version = %version, "staged version discarded");
        }
        Ok(discarded)
    }

    fn soft_delete(&self, document: &DocumentId, expected: VersionId) -> RegistryResult<Document> {
        let entry = self.entry(document)?;
        let mut guard = entry.write().map_err(|_| RegistryError::LockPoisoned)?;
        let record = guard
            .visible(false)
            .ok_or(RegistryError::NotFound(*document))?;
        let current = record.document.current_version_id;
        if expected != current || guard.staged.is_some() {
            return Err(RegistryError::ConcurrentModification {
                document: *document,
                expected,
                current,
            });
        }

        let mut record = record.clone();
        record.document.deleted_at = Some(now());
        self.store.save(&record)?;

        let doc = record.document.clone();
        guard.record = Some(record);
        info!(document = %document, "document soft-deleted");
        Ok(doc)
    }

    fn get(&self, document: &DocumentId, include_deleted: bool) -> RegistryResult<Document> {
        self.read(document, |entry| {
            entry
                .visible(include_deleted)
                .map(|r| r.document.clone())
                .ok_or(RegistryError::NotFound(*document))
        })
    }

    fn list(&self, include_deleted: bool) -> RegistryResult<Vec<Document>> {
        let mut docs = Vec::new();
        for entry in self.all_entries()? {
            let guard = entry.read().map_err(|_| RegistryError::LockPoisoned)?;
            if let Some(record) = guard.visible(include_deleted) {
                docs.push(record.document.clone());
            }
        }
        docs.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.document_id.cmp(&b.document_id))
        });
        Ok(docs)
    }

    fn versions(
        &self,
        document: &DocumentId,
        include_deleted: bool,
    ) -> RegistryResult<Vec<DocumentVersion>> {
        self.read(document, |entry| {
            entry
                .visible(include_deleted)
                .map(|r| r.versions.clone())
                .ok_or(RegistryError::NotFound(*document))
        })
    }

    fn version(&self, document: &DocumentId, version: VersionId) -> RegistryResult<DocumentVersion> {
        self.read(document, |entry| {
            let record = entry
                .visible(true)
                .ok_or(RegistryError::NotFound(*document))?;
            record
                .version(version)
                .cloned()
                .ok_or(RegistryError::VersionNotFound {
                    document: *document,
                    version,
                })
        })
    }

    fn record(&self, document: &DocumentId) -> RegistryResult<DocumentRecord> {
        self.read(document, |entry| {
            entry
                .visible(true)
                .cloned()
                .ok_or(RegistryError::NotFound(*document))
        })
    }
}

impl<S: RecordStore> std::fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("Registry").field("entries", &count).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentRef;
    use docseal_types::ContentHash;
    use std::thread;

    fn content(bytes: &[u8]) -> ContentRef {
        ContentRef {
            content_hash: ContentHash::digest(bytes),
            size: bytes.len() as u64,
            mime_type: "text/plain".into(),
        }
    }

    fn new_doc(title: &str) -> NewVersion {
        NewVersion {
            title: title.into(),
            description: "quarterly numbers".into(),
            content: content(title.as_bytes()),
            created_by: "alice".into(),
        }
    }

    fn published(registry: &InMemoryRegistry, title: &str) -> Document {
        let staged = registry.create(new_doc(title)).unwrap();
        registry
            .publish(&staged.document_id, staged.version_id, 1)
            .unwrap()
    }

    #[test]
    fn staged_document_is_invisible_until_published() {
        let registry = InMemoryRegistry::default();
        let staged = registry.create(new_doc("Report Q1")).unwrap();
        assert_eq!(staged.version_id, VersionId::INITIAL);
        assert!(staged.anchor_sequence.is_none());
        assert!(matches!(
            registry.get(&staged.document_id, true),
            Err(RegistryError::NotFound(_))
        ));
        assert!(registry.list_active().unwrap().is_empty());

        let doc = registry
            .publish(&staged.document_id, staged.version_id, 7)
            .unwrap();
        assert_eq!(doc.current_version_id, VersionId::INITIAL);
        assert_eq!(doc.title, "Report Q1");
        let v1 = registry.current_version(&doc.document_id, false).unwrap();
        assert_eq!(v1.anchor_sequence, Some(7));
        assert_eq!(registry.list_active().unwrap().len(), 1);
    }

    #[test]
    fn discard_of_new_document_leaves_nothing() {
        let registry = InMemoryRegistry::default();
        let staged = registry.create(new_doc("Draft")).unwrap();
        assert!(registry.discard(&staged.document_id, staged.version_id).unwrap());
        assert!(!registry.discard(&staged.document_id, staged.version_id).unwrap());
        assert!(registry.entries.read().unwrap().is_empty());
    }

    #[test]
    fn create_rejects_blank_title() {
        let registry = InMemoryRegistry::default();
        let err = registry.create(new_doc("   ")).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[test]
    fn new_version_carries_over_unchanged_fields() {
        let registry = InMemoryRegistry::default();
        let doc = published(&registry, "Report Q1");

        let changes = VersionChanges {
            content: Some(content(b"bytes B")),
            created_by: "bob".into(),
            ..Default::default()
        };
        let v2 = registry
            .create_version(&doc.document_id, VersionId::INITIAL, changes)
            .unwrap();
        assert_eq!(v2.version_id, VersionId::new(2));
        assert_eq!(v2.title, "Report Q1");
        assert_eq!(v2.content_hash, ContentHash::digest(b"bytes B"));

        // Not current until published.
        assert_eq!(
            registry.get(&doc.document_id, false).unwrap().current_version_id,
            VersionId::INITIAL
        );
        registry.publish(&doc.document_id, v2.version_id, 2).unwrap();

        let versions = registry.versions(&doc.document_id, false).unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].content_hash, ContentHash::digest(b"Report Q1"));
        assert_eq!(versions[1].created_by, "bob");
    }

    #[test]
    fn metadata_change_updates_document_head() {
        let registry = InMemoryRegistry::default();
        let doc = published(&registry, "Report Q1");
        let changes = VersionChanges {
            title: Some("Report Q1 (final)".into()),
            created_by: "alice".into(),
            ..Default::default()
        };
        let v2 = registry
            .create_version(&doc.document_id, doc.current_version_id, changes)
            .unwrap();
        let head = registry.publish(&doc.document_id, v2.version_id, 2).unwrap();
        assert_eq!(head.title, "Report Q1 (final)");
        assert_eq!(head.created_at, doc.created_at);
    }

    #[test]
    fn stale_expected_version_is_rejected() {
        let registry = InMemoryRegistry::default();
        let doc = published(&registry, "Report Q1");
        let err = registry
            .create_version(&doc.document_id, VersionId::new(5), VersionChanges::default())
            .unwrap_err();
        assert!(matches!(err, RegistryError::ConcurrentModification { .. }));
    }

    #[test]
    fn only_one_version_may_be_staged() {
        let registry = InMemoryRegistry::default();
        let doc = published(&registry, "Report Q1");
        let first = registry
            .create_version(&doc.document_id, VersionId::INITIAL, VersionChanges::default())
            .unwrap();
        let second = registry.create_version(&doc.document_id, VersionId::INITIAL, VersionChanges::default());
        assert!(matches!(second, Err(RegistryError::ConcurrentModification { .. })));
        let delete = registry.soft_delete(&doc.document_id, VersionId::INITIAL);
        assert!(matches!(delete, Err(RegistryError::ConcurrentModification { .. })));

        // After discard the version number is free again.
        registry.discard(&doc.document_id, first.version_id).unwrap();
        let retry = registry
            .create_version(&doc.document_id, VersionId::INITIAL, VersionChanges::default())
            .unwrap();
        assert_eq!(retry.version_id, first.version_id);
    }

    #[test]
    fn concurrent_staging_admits_exactly_one() {
        let registry = Arc::new(InMemoryRegistry::default());
        let id = published(&registry, "Report Q1").document_id;
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry
                        .create_version(&id, VersionId::INITIAL, VersionChanges::default())
                        .is_ok()
                })
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn publish_requires_matching_staged_version() {
        let registry = InMemoryRegistry::default();
        let doc = published(&registry, "Report Q1");
        let err = registry
            .publish(&doc.document_id, VersionId::new(2), 3)
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotStaged { .. }));
    }

    #[test]
    fn soft_delete_hides_but_keeps_history() {
        let registry = InMemoryRegistry::default();
        let doc = published(&registry, "Report Q1");
        let deleted = registry
            .soft_delete(&doc.document_id, doc.current_version_id)
            .unwrap();
        assert!(deleted.is_deleted());

        assert!(registry.get(&doc.document_id, false).is_err());
        assert!(registry.list_active().unwrap().is_empty());
        assert_eq!(registry.list(true).unwrap().len(), 1);
        assert_eq!(registry.versions(&doc.document_id, true).unwrap().len(), 1);
        assert!(registry.version(&doc.document_id, VersionId::INITIAL).is_ok());

        let again = registry.soft_delete(&doc.document_id, doc.current_version_id);
        assert!(matches!(again, Err(RegistryError::NotFound(_))));
        let update = registry.create_version(&doc.document_id, doc.current_version_id, VersionChanges::default());
        assert!(matches!(update, Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn file_registry_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (doc, digest) = {
            let registry = FileRegistry::open_dir(dir.path()).unwrap();
            let staged = registry.create(new_doc("Report Q1")).unwrap();
            let doc = registry
                .publish(&staged.document_id, staged.version_id, 1)
                .unwrap();
            // Staged versions are not persisted.
            registry
                .create_version(&doc.document_id, VersionId::INITIAL, VersionChanges::default())
                .unwrap();
            let digest = registry.record(&doc.document_id).unwrap().digest().unwrap();
            (doc, digest)
        };

        let registry = FileRegistry::open_dir(dir.path()).unwrap();
        assert_eq!(registry.get(&doc.document_id, false).unwrap(), doc);
        assert_eq!(registry.record(&doc.document_id).unwrap().digest().unwrap(), digest);
        let v2 = registry
            .create_version(&doc.document_id, VersionId::INITIAL, VersionChanges::default())
            .unwrap();
        assert_eq!(v2.version_id, VersionId::new(2));
    }

    #[test]
    fn corrupt_record_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        {
            let registry = FileRegistry::open_dir(dir.path()).unwrap();
            let staged = registry.create(new_doc("Report Q1")).unwrap();
            registry
                .publish(&staged.document_id, staged.version_id, 1)
                .unwrap();
            let path = registry.store().record_path(&staged.document_id);
            std::fs::write(path, b"{ not json").unwrap();
        }
        let err = FileRegistry::open_dir(dir.path()).unwrap_err();
        assert!(matches!(err, RegistryError::Corrupt { .. }));
    }
}
