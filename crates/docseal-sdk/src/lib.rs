//! High-level SDK for DocSeal.
//!
//! [`DocSeal`] is the main entry point for applications: it wires a content
//! store, document registry, integrity ledger, search index and verifier
//! together from a [`DocSealConfig`] and exposes the document operations.

pub mod config;
pub mod docseal;
pub mod error;
pub mod views;

pub use config::{DocSealConfig, StorageBackend, StorageConfig};
pub use docseal::DocSeal;
pub use error::{SdkError, SdkResult};
pub use views::{Ack, DocumentDetails, DocumentSummary, DocumentView};

// Re-export key types
pub use docseal_ledger::{AnchorRecord, AnchorStatus, LedgerStatus, ValidationReport};
pub use docseal_lifecycle::{DocumentChanges, LifecycleConfig, NewDocument, RetryPolicy};
pub use docseal_registry::DocumentVersion;
pub use docseal_types::{ContentHash, DocumentId, VersionId};
pub use docseal_verify::{AuditReport, DriftReason, VerificationResult};
