//! Filesystem-backed content store.
//!
//! Layout:
//! ```text
//! root/
//! └── blobs/
//!     └── {hash[0..2]}/
//!         └── {hash_hex}      ← raw bytes
//! ```
//!
//! Writes go to a temp file in the target directory, are fsynced, then
//! renamed into place without clobbering. Two writers racing on the same
//! bytes both produce the same final file, so the loser's rename failing
//! with `AlreadyExists` is success.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use docseal_crypto::ContentHasher;
use docseal_types::ContentHash;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// Durable, content-addressed blob directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("blobs"))?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path where the blob for `hash` lives (whether or not it exists).
    pub fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        let hex = hash.to_hex();
        self.root.join("blobs").join(&hex[..2]).join(hex)
    }

    fn write_new(&self, path: &Path, data: &[u8]) -> StoreResult<()> {
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Unavailable(format!("invalid blob path {}", path.display())))?;
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(path) {
            Ok(_) => {}
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "blob written concurrently; keeping existing copy");
            }
            Err(e) => return Err(StoreError::Io(e.error)),
        }

        // Make the rename itself durable.
        File::open(dir)?.sync_all()?;
        Ok(())
    }
}

impl ContentStore for FsContentStore {
    fn put(&self, data: &[u8]) -> StoreResult<ContentHash> {
        let hash = ContentHasher::BLOB.hash(data);
        let path = self.blob_path(&hash);
        if path.exists() {
            debug!(hash = %hash.short_hex(), "blob already stored");
            return Ok(hash);
        }
        self.write_new(&path, data)?;
        debug!(hash = %hash.short_hex(), size = data.len(), "blob stored");
        Ok(hash)
    }

    fn get(&self, hash: &ContentHash) -> StoreResult<Vec<u8>> {
        match fs::read(self.blob_path(hash)) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(*hash)),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.blob_path(hash).is_file())
    }

    fn list(&self) -> StoreResult<Vec<ContentHash>> {
        let mut hashes = Vec::new();
        for shard in fs::read_dir(self.root.join("blobs"))? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let name = entry?.file_name();
                // Temp files from interrupted writes never parse as hashes.
                if let Some(hash) = name.to_str().and_then(|n| ContentHash::from_hex(n).ok()) {
                    hashes.push(hash);
                }
            }
        }
        hashes.sort();
        Ok(hashes)
    }

    fn size(&self, hash: &ContentHash) -> StoreResult<u64> {
        match fs::metadata(self.blob_path(hash)) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(*hash)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn put_and_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path()).unwrap();
        let hash = store.put(b"report body").unwrap();
        assert_eq!(store.get(&hash).unwrap(), b"report body");
        assert!(store.blob_path(&hash).is_file());
        assert_eq!(store.size(&hash).unwrap(), 11);
    }

    #[test]
    fn blobs_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let hash = FsContentStore::open(dir.path()).unwrap().put(b"durable").unwrap();

        let reopened = FsContentStore::open(dir.path()).unwrap();
        assert!(reopened.exists(&hash).unwrap());
        assert_eq!(reopened.get_verified(&hash).unwrap(), b"durable");
    }

    #[test]
    fn duplicate_put_keeps_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path()).unwrap();
        let a = store.put(b"same").unwrap();
        let b = store.put(b"same").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.list().unwrap(), vec![a]);
    }

    #[test]
    fn missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path()).unwrap();
        let hash = ContentHash::digest(b"absent");
        assert!(!store.exists(&hash).unwrap());
        assert!(matches!(store.get(&hash), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn out_of_band_corruption_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path()).unwrap();
        let hash = store.put(b"signed contract").unwrap();
        fs::write(store.blob_path(&hash), b"forged contract").unwrap();

        assert_eq!(store.get(&hash).unwrap(), b"forged contract");
        assert!(matches!(
            store.get_verified(&hash),
            Err(StoreError::HashMismatch { .. })
        ));
    }

    #[test]
    fn concurrent_puts_of_same_bytes_converge() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsContentStore::open(dir.path()).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.put(b"racing payload").unwrap())
            })
            .collect();
        let hashes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.get_verified(&hashes[0]).unwrap(), b"racing payload");
    }

    #[test]
    fn list_ignores_stray_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path()).unwrap();
        let hash = store.put(b"x").unwrap();
        let shard = store.blob_path(&hash).parent().unwrap().to_path_buf();
        fs::write(shard.join(".tmpXYZ"), b"partial").unwrap();
        assert_eq!(store.list().unwrap(), vec![hash]);
    }
}
