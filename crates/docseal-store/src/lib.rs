//! Content-addressed blob storage for DocSeal.
//!
//! Every document version's bytes are stored as an immutable blob identified
//! by its domain-separated BLAKE3 hash. The hash is always recomputed by the
//! store; callers never supply it.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsContentStore`] -- durable, fanned-out directory of blob files
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written (content-addressing guarantees this).
//! 2. `put` is idempotent: identical bytes map to one stored blob.
//! 3. `put` returns only after the write is durable.
//! 4. Concurrent reads are always safe.
//! 5. Blobs are never deleted; orphaned blobs are tolerated.
//! 6. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::InMemoryContentStore;
pub use traits::ContentStore;
