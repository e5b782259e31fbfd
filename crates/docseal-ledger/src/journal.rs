//! Durable journals backing the ledger.
//!
//! A [`Journal`] only ever appends terminal records. The in-memory ledger
//! state is rebuilt from [`Journal::recover`] on open.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::record::AnchorRecord;

/// Records recovered from a journal, plus a description of any damage that
/// stopped recovery early.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recovered {
    pub records: Vec<AnchorRecord>,
    pub damage: Option<String>,
}

/// Append-only durable sink for anchor records.
pub trait Journal: Send + Sync {
    /// Read back every durable record in append order.
    fn recover(&self) -> LedgerResult<Recovered>;

    /// Durably append one record. Returns only once the write is on stable
    /// storage (or the backend's equivalent).
    fn append(&self, record: &AnchorRecord) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryJournal
// ---------------------------------------------------------------------------

/// Journal that keeps records in memory. For tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: Mutex<Vec<AnchorRecord>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a journal with existing records (e.g. to simulate a restart).
    pub fn with_records(records: Vec<AnchorRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl Journal for MemoryJournal {
    fn recover(&self) -> LedgerResult<Recovered> {
        let records = self.records.lock().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(Recovered {
            records: records.clone(),
            damage: None,
        })
    }

    fn append(&self, record: &AnchorRecord) -> io::Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| io::Error::other("memory journal lock poisoned"))?;
        records.push(record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileJournal
// ---------------------------------------------------------------------------

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: u64 = 8;

/// Single-file journal of length- and CRC-framed records.
///
/// On-disk format, repeated per record:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized AnchorRecord)]
/// ```
///
/// Every append is fsynced. A torn frame at the tail (crash mid-write) is
/// truncated away on recovery; a bad frame followed by more data is damage
/// and is reported, never skipped.
pub struct FileJournal {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileJournal {
    /// Open (or create) a journal file.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Journal for FileJournal {
    fn recover(&self) -> LedgerResult<Recovered> {
        let file = self.file.lock().map_err(|_| LedgerError::LockPoisoned)?;
        let mut reader = File::open(&self.path)?;
        let file_len = reader.metadata()?.len();
        let mut recovered = Recovered::default();
        let mut offset: u64 = 0;

        while offset + HEADER_SIZE <= file_len {
            reader.seek(SeekFrom::Start(offset))?;
            let mut header = [0u8; HEADER_SIZE as usize];
            reader.read_exact(&mut header)?;
            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
            let frame_end = offset + HEADER_SIZE + u64::from(length);

            if length == 0 || frame_end > file_len {
                break;
            }

            let mut payload = vec![0u8; length as usize];
            reader.read_exact(&mut payload)?;

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                recovered.damage = Some(format!(
                    "CRC mismatch at offset {offset}: expected {expected_crc:#010x}, got {actual_crc:#010x}"
                ));
                warn!(offset, "journal CRC mismatch; stopping recovery");
                return Ok(recovered);
            }

            match bincode::deserialize::<AnchorRecord>(&payload) {
                Ok(record) => recovered.records.push(record),
                Err(e) => {
                    recovered.damage = Some(format!("undecodable record at offset {offset}: {e}"));
                    warn!(offset, error = %e, "journal record undecodable; stopping recovery");
                    return Ok(recovered);
                }
            }
            offset = frame_end;
        }

        if offset < file_len {
            warn!(offset, file_len, "torn journal tail; truncating");
            file.set_len(offset)?;
            file.sync_all()?;
        }

        debug!(recovered = recovered.records.len(), "journal recovery complete");
        Ok(recovered)
    }

    fn append(&self, record: &AnchorRecord) -> io::Result<()> {
        let payload = bincode::serialize(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "anchor record too large"))?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE as usize + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("journal lock poisoned"))?;
        let start = file.metadata()?.len();

        let written = file.write_all(&frame).and_then(|()| file.sync_data());
        if let Err(e) = written {
            // Drop the partial frame so the next append starts clean.
            if let Err(trunc) = file.set_len(start) {
                warn!(error = %trunc, "failed to roll back partial journal frame");
            }
            return Err(e);
        }

        debug!(seq = record.sequence, offset = start, len = frame.len(), "journal append");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AnchorStatus;
    use docseal_types::{now, ContentHash, DocumentId, VersionId, VersionRef};

    fn records(count: u64) -> Vec<AnchorRecord> {
        let mut out: Vec<AnchorRecord> = Vec::new();
        for seq in 1..=count {
            let prev = out.last().map(|r| r.record_hash);
            out.push(
                AnchorRecord::pending(
                    seq,
                    ContentHash::digest(&seq.to_le_bytes()),
                    VersionRef::new(DocumentId::new(), VersionId::INITIAL),
                    now(),
                    prev,
                )
                .sealed(AnchorStatus::Confirmed),
            );
        }
        out
    }

    #[test]
    fn memory_journal_roundtrip() {
        let journal = MemoryJournal::new();
        for r in records(3) {
            journal.append(&r).unwrap();
        }
        let recovered = journal.recover().unwrap();
        assert_eq!(recovered.records.len(), 3);
        assert!(recovered.damage.is_none());
    }

    #[test]
    fn file_journal_recovers_appended_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        let written = records(5);
        {
            let journal = FileJournal::open(&path).unwrap();
            for r in &written {
                journal.append(r).unwrap();
            }
        }

        let journal = FileJournal::open(&path).unwrap();
        let recovered = journal.recover().unwrap();
        assert_eq!(recovered.records, written);
        assert!(recovered.damage.is_none());
    }

    #[test]
    fn torn_tail_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        let journal = FileJournal::open(&path).unwrap();
        for r in records(2) {
            journal.append(&r).unwrap();
        }
        let good_len = fs::metadata(&path).unwrap().len();

        // Half a header from an interrupted write.
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(&[0xff, 0x00, 0x00]).unwrap();
        drop(f);

        let recovered = journal.recover().unwrap();
        assert_eq!(recovered.records.len(), 2);
        assert!(recovered.damage.is_none());
        assert_eq!(fs::metadata(&path).unwrap().len(), good_len);
    }

    #[test]
    fn crc_mismatch_is_reported_as_damage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        let journal = FileJournal::open(&path).unwrap();
        for r in records(3) {
            journal.append(&r).unwrap();
        }

        // Flip a payload byte inside the first frame.
        let mut bytes = fs::read(&path).unwrap();
        bytes[HEADER_SIZE as usize + 2] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        let recovered = journal.recover().unwrap();
        assert!(recovered.records.is_empty());
        assert!(recovered.damage.unwrap().contains("CRC mismatch"));
    }
}
