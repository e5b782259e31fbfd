use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use docseal_types::{now, ContentHash, DocumentId, VersionRef};
use tracing::{debug, error, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::journal::{FileJournal, Journal, MemoryJournal};
use crate::record::{AnchorRecord, AnchorStatus, LedgerStatus};
use crate::traits::IntegrityLedger;
use crate::validation::{LedgerValidator, ValidationReport};

/// Ledger kept in memory only. For tests, local demos, and embedding.
pub type InMemoryLedger = Ledger<MemoryJournal>;

/// Ledger journaled to a single append-only file.
pub type FileLedger = Ledger<FileJournal>;

/// The integrity ledger over a durable [`Journal`].
///
/// All state lives behind one `RwLock`. Appends hold the write lock for the
/// duration of the journal write, which makes sequence assignment a single
/// serialization point; reads only contend with that append.
pub struct Ledger<J: Journal> {
    journal: J,
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    records: Vec<AnchorRecord>,
    by_hash: HashMap<ContentHash, Vec<usize>>,
    by_document: HashMap<DocumentId, Vec<usize>>,
    halted: Option<String>,
}

impl LedgerState {
    fn push(&mut self, record: AnchorRecord) -> usize {
        let index = self.records.len();
        self.by_hash.entry(record.content_hash).or_default().push(index);
        self.by_document
            .entry(record.version.document_id)
            .or_default()
            .push(index);
        self.records.push(record);
        index
    }

    /// Drop the newest record and its index entries.
    fn pop(&mut self) -> Option<AnchorRecord> {
        let record = self.records.pop()?;
        if let Some(indexes) = self.by_hash.get_mut(&record.content_hash) {
            indexes.pop();
        }
        if let Some(indexes) = self.by_document.get_mut(&record.version.document_id) {
            indexes.pop();
        }
        Some(record)
    }

    fn latest_confirmed_in(&self, indexes: Option<&Vec<usize>>) -> Option<&AnchorRecord> {
        indexes?
            .iter()
            .rev()
            .map(|&i| &self.records[i])
            .find(|r| r.is_confirmed())
    }

    fn halt(&mut self, reason: String) {
        error!(%reason, "ledger halted");
        self.halted = Some(reason);
    }
}

impl Ledger<MemoryJournal> {
    /// An empty in-memory ledger.
    pub fn in_memory() -> Self {
        // A fresh memory journal always recovers cleanly.
        Self {
            journal: MemoryJournal::new(),
            inner: RwLock::new(LedgerState::default()),
        }
    }
}

impl Default for Ledger<MemoryJournal> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Ledger<FileJournal> {
    /// Open (or create) a file-backed ledger at `path`.
    pub fn open_file(path: &Path) -> LedgerResult<Self> {
        Self::open(FileJournal::open(path)?)
    }
}

impl<J: Journal> Ledger<J> {
    /// Rebuild ledger state from a journal.
    ///
    /// Journal damage or a sequence that is not exactly `1..=n` halts the
    /// ledger: reads still work, every later `anchor` fails.
    pub fn open(journal: J) -> LedgerResult<Self> {
        let recovered = journal.recover()?;
        let mut state = LedgerState::default();

        for record in recovered.records {
            let expected = state.records.len() as u64 + 1;
            if record.sequence != expected {
                let err = LedgerError::SequenceCorruption {
                    expected,
                    found: record.sequence,
                };
                state.halt(err.to_string());
                break;
            }
            state.push(record);
        }
        if let Some(damage) = recovered.damage {
            if state.halted.is_none() {
                state.halt(format!("journal damage: {damage}"));
            }
        }

        info!(records = state.records.len(), halted = state.halted.is_some(), "ledger opened");
        Ok(Self {
            journal,
            inner: RwLock::new(state),
        })
    }

    /// The reason anchoring is halted, if it is.
    pub fn halted(&self) -> LedgerResult<Option<String>> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.halted.clone())
    }

    pub fn journal(&self) -> &J {
        &self.journal
    }
}

impl<J: Journal> IntegrityLedger for Ledger<J> {
    fn anchor(&self, content_hash: ContentHash, version: VersionRef) -> LedgerResult<AnchorRecord> {
        let mut state = self.inner.write().map_err(|_| LedgerError::LockPoisoned)?;

        if let Some(reason) = &state.halted {
            return Err(LedgerError::Halted(reason.clone()));
        }

        let sequence = state.records.len() as u64 + 1;
        let last = state.records.last().map(|r| (r.sequence, r.record_hash));
        if let Some((found, _)) = last {
            if found != sequence - 1 {
                let err = LedgerError::SequenceCorruption {
                    expected: sequence - 1,
                    found,
                };
                state.halt(err.to_string());
                return Err(err);
            }
        }
        let prev_hash = last.map(|(_, hash)| hash);

        let pending = AnchorRecord::pending(sequence, content_hash, version, now(), prev_hash);
        let index = state.push(pending.clone());

        let confirmed = pending.sealed(AnchorStatus::Confirmed);
        let written = match self.journal.append(&confirmed) {
            Ok(()) => Ok(()),
            // A reported sequence is always durable: the failed record is
            // journaled before the error is returned.
            Err(e) => {
                let failed = pending.sealed(AnchorStatus::Failed);
                match self.journal.append(&failed) {
                    Ok(()) => {
                        state.records[index] = failed;
                        Err(e)
                    }
                    Err(second) => {
                        state.pop();
                        let reason = format!(
                            "journal state unknown at seq {sequence}: {e}; failed record not written: {second}"
                        );
                        state.halt(reason.clone());
                        return Err(LedgerError::Halted(reason));
                    }
                }
            }
        };

        match written {
            Ok(()) => {
                state.records[index] = confirmed.clone();
                debug!(
                    seq = sequence,
                    hash = %content_hash.short_hex(),
                    version = %version,
                    "anchor confirmed"
                );
                Ok(confirmed)
            }
            Err(e) => {
                warn!(seq = sequence, error = %e, "anchor journal write failed");
                Err(LedgerError::AnchorFailure {
                    sequence,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn verify(&self, content_hash: &ContentHash) -> LedgerResult<LedgerStatus> {
        Ok(match self.latest_confirmed(content_hash)? {
            Some(_) => LedgerStatus::Confirmed,
            None => LedgerStatus::Unanchored,
        })
    }

    fn record(&self, sequence: u64) -> LedgerResult<Option<AnchorRecord>> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        if sequence == 0 {
            return Ok(None);
        }
        Ok(state.records.get((sequence - 1) as usize).cloned())
    }

    fn records(&self) -> LedgerResult<Vec<AnchorRecord>> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.records.clone())
    }

    fn latest_confirmed(&self, content_hash: &ContentHash) -> LedgerResult<Option<AnchorRecord>> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state
            .latest_confirmed_in(state.by_hash.get(content_hash))
            .cloned())
    }

    fn latest_for_document(&self, document: &DocumentId) -> LedgerResult<Option<AnchorRecord>> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state
            .latest_confirmed_in(state.by_document.get(document))
            .cloned())
    }

    fn len(&self) -> LedgerResult<u64> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.records.len() as u64)
    }

    fn validate(&self) -> LedgerResult<ValidationReport> {
        let records = self.records()?;
        Ok(LedgerValidator::validate(&records))
    }
}

impl<J: Journal> std::fmt::Debug for Ledger<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.inner.read().map(|s| s.records.len()).unwrap_or(0);
        f.debug_struct("Ledger").field("record_count", &count).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use docseal_types::VersionId;

    use crate::journal::Recovered;

    /// Journal that fails the next `n` appends.
    #[derive(Default)]
    struct FlakyJournal {
        inner: MemoryJournal,
        failures: AtomicUsize,
    }

    impl FlakyJournal {
        fn failing(n: usize) -> Self {
            Self {
                inner: MemoryJournal::new(),
                failures: AtomicUsize::new(n),
            }
        }
    }

    impl Journal for FlakyJournal {
        fn recover(&self) -> LedgerResult<Recovered> {
            self.inner.recover()
        }

        fn append(&self, record: &AnchorRecord) -> io::Result<()> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(io::Error::other("disk full"));
            }
            self.inner.append(record)
        }
    }

    /// Journal handle that outlives the ledger, for reopen tests.
    #[derive(Clone, Default)]
    struct SharedJournal(Arc<FlakyJournal>);

    impl Journal for SharedJournal {
        fn recover(&self) -> LedgerResult<Recovered> {
            self.0.recover()
        }

        fn append(&self, record: &AnchorRecord) -> io::Result<()> {
            self.0.append(record)
        }
    }

    fn vref(version: u64) -> VersionRef {
        VersionRef::new(DocumentId::new(), VersionId::new(version))
    }

    #[test]
    fn anchor_assigns_sequences_from_one() {
        let ledger = InMemoryLedger::default();
        let a = ledger.anchor(ContentHash::digest(b"a"), vref(1)).unwrap();
        let b = ledger.anchor(ContentHash::digest(b"b"), vref(1)).unwrap();
        assert_eq!(a.sequence, 1);
        assert_eq!(b.sequence, 2);
        assert_eq!(b.prev_hash, Some(a.record_hash));
        assert!(a.is_confirmed() && b.is_confirmed());
        assert_eq!(ledger.len().unwrap(), 2);
    }

    #[test]
    fn verify_reports_confirmed_and_unanchored() {
        let ledger = InMemoryLedger::default();
        let hash = ContentHash::digest(b"doc");
        assert_eq!(ledger.verify(&hash).unwrap(), LedgerStatus::Unanchored);
        ledger.anchor(hash, vref(1)).unwrap();
        assert_eq!(ledger.verify(&hash).unwrap(), LedgerStatus::Confirmed);
    }

    #[test]
    fn failed_write_keeps_failed_record_and_retry_gets_new_sequence() {
        let ledger = Ledger::open(FlakyJournal::failing(1)).unwrap();
        let hash = ContentHash::digest(b"doc");

        let err = ledger.anchor(hash, vref(1)).unwrap_err();
        assert!(matches!(err, LedgerError::AnchorFailure { sequence: 1, .. }));
        assert_eq!(ledger.verify(&hash).unwrap(), LedgerStatus::Unanchored);
        assert_eq!(ledger.record(1).unwrap().unwrap().status, AnchorStatus::Failed);

        let retry = ledger.anchor(hash, vref(1)).unwrap();
        assert_eq!(retry.sequence, 2);
        assert_eq!(ledger.verify(&hash).unwrap(), LedgerStatus::Confirmed);

        let durable = ledger.journal().recover().unwrap().records;
        assert_eq!(durable.len(), 2);
        assert_eq!(durable[0].status, AnchorStatus::Failed);
        assert_eq!(durable[1].status, AnchorStatus::Confirmed);
        assert!(ledger.validate().unwrap().is_valid());
    }

    #[test]
    fn failed_sequence_survives_restart() {
        let journal = SharedJournal(Arc::new(FlakyJournal::failing(1)));
        let hash = ContentHash::digest(b"doc");
        {
            let ledger = Ledger::open(journal.clone()).unwrap();
            let err = ledger.anchor(hash, vref(1)).unwrap_err();
            assert!(matches!(err, LedgerError::AnchorFailure { sequence: 1, .. }));
        }

        let ledger = Ledger::open(journal).unwrap();
        assert!(ledger.halted().unwrap().is_none());
        assert_eq!(ledger.record(1).unwrap().unwrap().status, AnchorStatus::Failed);
        let retry = ledger.anchor(hash, vref(1)).unwrap();
        assert_eq!(retry.sequence, 2);
        assert!(ledger.validate().unwrap().is_valid());
    }

    #[test]
    fn unwritable_failed_record_halts_without_reporting_sequence() {
        let journal = SharedJournal(Arc::new(FlakyJournal::failing(2)));
        let hash = ContentHash::digest(b"doc");
        {
            let ledger = Ledger::open(journal.clone()).unwrap();
            let err = ledger.anchor(hash, vref(1)).unwrap_err();
            assert!(matches!(err, LedgerError::Halted(_)));
            assert_eq!(ledger.len().unwrap(), 0);
            assert_eq!(ledger.verify(&hash).unwrap(), LedgerStatus::Unanchored);
            assert!(ledger.anchor(hash, vref(1)).unwrap_err().is_fatal());
        }

        let ledger = Ledger::open(journal).unwrap();
        assert_eq!(ledger.len().unwrap(), 0);
        assert_eq!(ledger.anchor(hash, vref(1)).unwrap().sequence, 1);
    }

    #[test]
    fn latest_confirmed_tracks_most_recent_record() {
        let ledger = InMemoryLedger::default();
        let hash = ContentHash::digest(b"same bytes");
        let doc = DocumentId::new();
        ledger.anchor(hash, VersionRef::new(doc, VersionId::new(1))).unwrap();
        let second = ledger.anchor(hash, VersionRef::new(doc, VersionId::new(2))).unwrap();
        assert_eq!(ledger.latest_confirmed(&hash).unwrap().unwrap().sequence, second.sequence);
    }

    #[test]
    fn latest_for_document_ignores_other_documents() {
        let ledger = InMemoryLedger::default();
        let doc = DocumentId::new();
        let mine = ledger
            .anchor(ContentHash::digest(b"v1"), VersionRef::new(doc, VersionId::INITIAL))
            .unwrap();
        ledger.anchor(ContentHash::digest(b"other"), vref(1)).unwrap();
        let latest = ledger.latest_for_document(&doc).unwrap().unwrap();
        assert_eq!(latest, mine);
        assert!(ledger.latest_for_document(&DocumentId::new()).unwrap().is_none());
    }

    #[test]
    fn record_lookup_bounds() {
        let ledger = InMemoryLedger::default();
        ledger.anchor(ContentHash::digest(b"x"), vref(1)).unwrap();
        assert!(ledger.record(0).unwrap().is_none());
        assert!(ledger.record(1).unwrap().is_some());
        assert!(ledger.record(2).unwrap().is_none());
    }

    #[test]
    fn concurrent_anchors_form_gap_free_permutation() {
        let ledger = Arc::new(InMemoryLedger::default());
        let n = 64u64;
        let handles: Vec<_> = (0..n)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    ledger
                        .anchor(ContentHash::digest(&i.to_le_bytes()), vref(1))
                        .unwrap()
                        .sequence
                })
            })
            .collect();

        let sequences: HashSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(sequences.len() as u64, n);
        assert_eq!(sequences, (1..=n).collect::<HashSet<_>>());
        assert!(ledger.validate().unwrap().is_valid());
    }

    #[test]
    fn reopen_restores_records_and_continues_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anchors.journal");
        let hash = ContentHash::digest(b"persisted");
        {
            let ledger = FileLedger::open_file(&path).unwrap();
            ledger.anchor(hash, vref(1)).unwrap();
            ledger.anchor(ContentHash::digest(b"next"), vref(2)).unwrap();
        }

        let ledger = FileLedger::open_file(&path).unwrap();
        assert_eq!(ledger.len().unwrap(), 2);
        assert_eq!(ledger.verify(&hash).unwrap(), LedgerStatus::Confirmed);
        let third = ledger.anchor(ContentHash::digest(b"third"), vref(3)).unwrap();
        assert_eq!(third.sequence, 3);
        assert!(ledger.validate().unwrap().is_valid());
    }

    #[test]
    fn duplicate_sequence_on_open_halts_anchoring() {
        let source = InMemoryLedger::default();
        let first = source.anchor(ContentHash::digest(b"a"), vref(1)).unwrap();
        let journal = MemoryJournal::with_records(vec![first.clone(), first]);

        let ledger = Ledger::open(journal).unwrap();
        assert!(ledger.halted().unwrap().is_some());
        assert_eq!(ledger.len().unwrap(), 1);

        let err = ledger.anchor(ContentHash::digest(b"b"), vref(1)).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, LedgerError::Halted(_)));
    }

    #[test]
    fn in_memory_corruption_is_detected_on_append() {
        let ledger = InMemoryLedger::default();
        ledger.anchor(ContentHash::digest(b"a"), vref(1)).unwrap();
        ledger.inner.write().unwrap().records[0].sequence = 7;

        let err = ledger.anchor(ContentHash::digest(b"b"), vref(1)).unwrap_err();
        assert_eq!(err, LedgerError::SequenceCorruption { expected: 1, found: 7 });
        assert!(ledger.halted().unwrap().is_some());
    }
}
