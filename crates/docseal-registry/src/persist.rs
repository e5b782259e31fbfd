//! Durable homes for published document records.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use docseal_types::DocumentId;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::types::DocumentRecord;

/// Backing store for published records. Staged versions are never saved.
pub trait RecordStore: Send + Sync {
    /// Every saved record.
    fn load(&self) -> RegistryResult<Vec<DocumentRecord>>;

    /// Durably replace the record for `record.document.document_id`.
    fn save(&self, record: &DocumentRecord) -> RegistryResult<()>;
}

/// Records kept in memory.
#[derive(Debug, Default)]
pub struct MemoryRecords {
    records: Mutex<BTreeMap<DocumentId, DocumentRecord>>,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecords {
    fn load(&self) -> RegistryResult<Vec<DocumentRecord>> {
        let records = self.records.lock().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(records.values().cloned().collect())
    }

    fn save(&self, record: &DocumentRecord) -> RegistryResult<()> {
        let mut records = self.records.lock().map_err(|_| RegistryError::LockPoisoned)?;
        records.insert(record.document.document_id, record.clone());
        Ok(())
    }
}

/// One canonical JSON file per document.
///
/// Layout:
/// ```text
/// root/
/// └── documents/
///     └── {document_id}.json
/// ```
///
/// Each save writes a temp file beside the target, fsyncs it, and renames it
/// over the old record, so a reader sees either the old or the new record.
#[derive(Debug, Clone)]
pub struct FileRecords {
    dir: PathBuf,
}

impl FileRecords {
    /// Open (or create) the record directory under `root`.
    pub fn open(root: impl AsRef<Path>) -> RegistryResult<Self> {
        let dir = root.as_ref().join("documents");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn record_path(&self, document: &DocumentId) -> PathBuf {
        self.dir.join(format!("{document}.json"))
    }

    fn read_record(path: &Path) -> RegistryResult<DocumentRecord> {
        let bytes = fs::read(path)?;
        let record: DocumentRecord =
            serde_json::from_slice(&bytes).map_err(|e| RegistryError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        record.check().map_err(|reason| RegistryError::Corrupt {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(record)
    }
}

impl RecordStore for FileRecords {
    fn load(&self) -> RegistryResult<Vec<DocumentRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                // Leftover temp files from interrupted saves.
                continue;
            }
            records.push(Self::read_record(&path)?);
        }
        debug!(count = records.len(), dir = %self.dir.display(), "registry records loaded");
        Ok(records)
    }

    fn save(&self, record: &DocumentRecord) -> RegistryResult<()> {
        let bytes = record.to_canonical_json()?;
        let path = self.record_path(&record.document.document_id);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| RegistryError::Io(e.error))?;

        // Make the rename itself durable.
        File::open(&self.dir)?.sync_all()?;
        debug!(document = %record.document.document_id, path = %path.display(), "registry record saved");
        Ok(())
    }
}
