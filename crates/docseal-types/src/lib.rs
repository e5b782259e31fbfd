//! Foundation types for DocSeal.
//!
//! This crate provides the identity and structural types shared by every
//! other DocSeal crate.
//!
//! # Key Types
//!
//! - [`ContentHash`]: Content-addressed identifier (BLAKE3 digest) for blobs
//! - [`DocumentId`]: Stable UUID v7 document identity
//! - [`VersionId`]: Per-document, monotonically increasing version number
//! - [`VersionRef`]: A (document, version) pair, used by ledger anchors
//! - [`Timestamp`]: UTC wall-clock time

pub mod error;
pub mod hash;
pub mod identity;
pub mod time;

pub use error::TypeError;
pub use hash::ContentHash;
pub use identity::{DocumentId, VersionId, VersionRef};
pub use time::{now, Timestamp};
