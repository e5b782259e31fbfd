//! Append-only integrity ledger for DocSeal.
//!
//! The ledger is the source of truth for "has this content been committed,
//! and is it unaltered". It provides:
//! - [`AnchorRecord`]: a content hash committed at a gap-free sequence
//!   position, hash-chained to its predecessor
//! - the [`IntegrityLedger`] trait boundary
//! - [`Ledger`], generic over a durable [`Journal`] ([`MemoryJournal`] or
//!   the CRC-framed [`FileJournal`])
//! - [`LedgerValidator`] for whole-log integrity checks
//!
//! Sequence assignment is the single serialization point across all
//! documents. Detected sequence corruption halts anchoring permanently.

pub mod error;
pub mod journal;
pub mod ledger;
pub mod record;
pub mod traits;
pub mod validation;

pub use error::{LedgerError, LedgerResult};
pub use journal::{FileJournal, Journal, MemoryJournal, Recovered};
pub use ledger::{FileLedger, InMemoryLedger, Ledger};
pub use record::{AnchorRecord, AnchorStatus, LedgerStatus};
pub use traits::IntegrityLedger;
pub use validation::{LedgerValidator, ValidationReport, Violation, ViolationKind};
