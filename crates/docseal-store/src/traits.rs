use docseal_crypto::ContentHasher;
use docseal_types::ContentHash;

use crate::error::{StoreError, StoreResult};

/// Content-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - The returned hash is computed by the store from the bytes.
/// - `put` of bytes already present is a no-op returning the same hash.
/// - `put` returns only once the blob is durable.
/// - Concurrent `put`s of identical bytes never produce duplicate or
///   partially written blobs.
pub trait ContentStore: Send + Sync {
    /// Store bytes and return their content hash.
    fn put(&self, data: &[u8]) -> StoreResult<ContentHash>;

    /// Read the raw bytes stored under `hash`.
    ///
    /// Returns `StoreError::NotFound` if absent. The bytes are returned as
    /// stored; use [`ContentStore::get_verified`] to check them.
    fn get(&self, hash: &ContentHash) -> StoreResult<Vec<u8>>;

    /// Check whether a blob exists.
    fn exists(&self, hash: &ContentHash) -> StoreResult<bool>;

    /// All stored hashes, sorted.
    fn list(&self) -> StoreResult<Vec<ContentHash>>;

    /// Read bytes and fail with `HashMismatch` if they no longer hash to `hash`.
    fn get_verified(&self, hash: &ContentHash) -> StoreResult<Vec<u8>> {
        let data = self.get(hash)?;
        let computed = ContentHasher::BLOB.hash(&data);
        if computed != *hash {
            return Err(StoreError::HashMismatch {
                expected: *hash,
                computed,
            });
        }
        Ok(data)
    }

    /// Size in bytes of the stored blob.
    fn size(&self, hash: &ContentHash) -> StoreResult<u64> {
        Ok(self.get(hash)?.len() as u64)
    }
}
