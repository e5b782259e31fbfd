//! Lifecycle coordinator for DocSeal.
//!
//! Every create and update runs one pipeline: store the bytes, stage the
//! version, anchor its hash, index it, publish it. Each operation carries a
//! [`LifecycleState`] that only moves along legal transitions. Any failure
//! after staging discards the staged version and restores the index, so a
//! half-finished write is never visible; blobs and anchors already written
//! are kept.
//!
//! Writes to one document are serialized by a per-document async lock with
//! a bounded wait. Store and ledger steps are retried with exponential
//! backoff and jitter.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod locks;
pub mod retry;
pub mod state;

pub use config::LifecycleConfig;
pub use coordinator::{Committed, DocumentChanges, LifecycleCoordinator, NewDocument};
pub use error::{LifecycleError, LifecycleResult};
pub use locks::DocumentLocks;
pub use retry::RetryPolicy;
pub use state::{LifecycleEvent, LifecycleState};
