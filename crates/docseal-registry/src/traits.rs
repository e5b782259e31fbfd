//! The [`DocumentRegistry`] trait defining the catalog interface.

use docseal_types::{DocumentId, VersionId};

use crate::error::RegistryResult;
use crate::types::{Document, DocumentRecord, DocumentVersion, NewVersion, VersionChanges};

/// Catalog mapping document identity to its version lineage.
///
/// Implementations must be thread-safe (`Send + Sync`). Writes are
/// two-phase: a staged version is invisible to every read until
/// [`publish`](DocumentRegistry::publish) succeeds.
pub trait DocumentRegistry: Send + Sync {
    /// Stage version 1 of a new document.
    fn create(&self, new: NewVersion) -> RegistryResult<DocumentVersion>;

    /// Stage the next version of an existing document.
    ///
    /// Fails with `ConcurrentModification` if `expected` is not the current
    /// version or another version is already staged.
    fn create_version(
        &self,
        document: &DocumentId,
        expected: VersionId,
        changes: VersionChanges,
    ) -> RegistryResult<DocumentVersion>;

    /// Make the staged version current, recording its anchor sequence.
    fn publish(
        &self,
        document: &DocumentId,
        version: VersionId,
        anchor_sequence: u64,
    ) -> RegistryResult<Document>;

    /// Drop a staged version. Returns `false` if it was not staged.
    fn discard(&self, document: &DocumentId, version: VersionId) -> RegistryResult<bool>;

    /// Mark a document deleted, keeping every version.
    fn soft_delete(&self, document: &DocumentId, expected: VersionId) -> RegistryResult<Document>;

    /// Look up a published document.
    fn get(&self, document: &DocumentId, include_deleted: bool) -> RegistryResult<Document>;

    /// All published documents, oldest first.
    fn list(&self, include_deleted: bool) -> RegistryResult<Vec<Document>>;

    /// Published lineage of a document in ascending version order.
    fn versions(
        &self,
        document: &DocumentId,
        include_deleted: bool,
    ) -> RegistryResult<Vec<DocumentVersion>>;

    /// A single published version. Resolves for deleted documents too.
    fn version(&self, document: &DocumentId, version: VersionId) -> RegistryResult<DocumentVersion>;

    /// The full persisted record of a document, deleted or not.
    fn record(&self, document: &DocumentId) -> RegistryResult<DocumentRecord>;

    /// Documents that are not deleted.
    fn list_active(&self) -> RegistryResult<Vec<Document>> {
        self.list(false)
    }

    /// The version `current_version_id` points at.
    fn current_version(
        &self,
        document: &DocumentId,
        include_deleted: bool,
    ) -> RegistryResult<DocumentVersion> {
        let doc = self.get(document, include_deleted)?;
        self.version(document, doc.current_version_id)
    }
}
