//! Verification service for DocSeal.
//!
//! Recomputes a version's content hash from stored bytes and checks it
//! against both the registry's expectation (storage corruption) and the
//! integrity ledger (chain drift). A failed check is a
//! [`VerificationResult`] with a [`DriftReason`], never an error; errors are
//! reserved for components that could not be consulted at all.

pub mod error;
pub mod service;
pub mod types;

pub use error::{VerifyError, VerifyResult};
pub use service::VerificationService;
pub use types::{AuditReport, DriftReason, VerificationResult};
