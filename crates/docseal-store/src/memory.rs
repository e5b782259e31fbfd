use std::collections::HashMap;
use std::sync::RwLock;

use docseal_crypto::ContentHasher;
use docseal_types::ContentHash;

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Blobs are held behind a `RwLock`, so
/// reads run concurrently and writers are serialized by the map insert.
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<ContentHash, Vec<u8>>>,
}

impl InMemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .map(|m| m.values().map(|b| b.len() as u64).sum())
            .unwrap_or(0)
    }

    /// Overwrite a stored blob without rehashing, as out-of-band
    /// corruption would. Returns `false` if no blob exists under `hash`.
    pub fn corrupt(&self, hash: &ContentHash, data: Vec<u8>) -> bool {
        match self.blobs.write() {
            Ok(mut map) => match map.get_mut(hash) {
                Some(blob) => {
                    *blob = data;
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Unavailable("content store lock poisoned".into())
}

impl ContentStore for InMemoryContentStore {
    fn put(&self, data: &[u8]) -> StoreResult<ContentHash> {
        let hash = ContentHasher::BLOB.hash(data);
        let mut map = self.blobs.write().map_err(poisoned)?;
        // Idempotent: identical bytes always map to the same key.
        map.entry(hash).or_insert_with(|| data.to_vec());
        Ok(hash)
    }

    fn get(&self, hash: &ContentHash) -> StoreResult<Vec<u8>> {
        let map = self.blobs.read().map_err(poisoned)?;
        map.get(hash).cloned().ok_or(StoreError::NotFound(*hash))
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        let map = self.blobs.read().map_err(poisoned)?;
        Ok(map.contains_key(hash))
    }

    fn list(&self) -> StoreResult<Vec<ContentHash>> {
        let map = self.blobs.read().map_err(poisoned)?;
        let mut hashes: Vec<ContentHash> = map.keys().copied().collect();
        hashes.sort();
        Ok(hashes)
    }

    fn size(&self, hash: &ContentHash) -> StoreResult<u64> {
        let map = self.blobs.read().map_err(poisoned)?;
        map.get(hash)
            .map(|b| b.len() as u64)
            .ok_or(StoreError::NotFound(*hash))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
