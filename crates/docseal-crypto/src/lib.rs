//! Cryptographic primitives for DocSeal.
//!
//! Provides domain-separated BLAKE3 hashing for blobs and records, and the
//! hash chain rules that make the integrity ledger tamper-evident.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod chain;
pub mod hasher;

pub use chain::{ChainError, ChainLink, HashChainVerifier};
pub use hasher::{ContentHasher, HasherError};
