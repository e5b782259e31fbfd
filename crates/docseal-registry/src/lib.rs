//! Document catalog for DocSeal.
//!
//! The registry maps a [`DocumentId`](docseal_types::DocumentId) to its
//! version lineage. Every write is two-phase: `create`/`create_version`
//! stage a version that no reader can see, and `publish` makes it current.
//! `discard` rolls a staged version back without the current pointer ever
//! having moved, so readers never observe a half-finished pipeline.
//!
//! # Backends
//!
//! - [`InMemoryRegistry`] -- records held only in memory
//! - [`FileRegistry`] -- one JSON record per document under `root/documents/`

pub mod error;
pub mod persist;
pub mod registry;
pub mod traits;
pub mod types;

pub use error::{RegistryError, RegistryResult};
pub use persist::{FileRecords, MemoryRecords, RecordStore};
pub use registry::{FileRegistry, InMemoryRegistry, Registry};
pub use traits::DocumentRegistry;
pub use types::{ContentRef, Document, DocumentRecord, DocumentVersion, NewVersion, VersionChanges};
