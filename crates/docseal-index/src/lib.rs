//! Search index for DocSeal.
//!
//! A derived, rebuildable projection of document titles and descriptions.
//! Nothing here is persisted: [`SearchIndex::rebuild`] recreates it from the
//! registry at startup.

pub mod error;
pub mod index;

pub use error::{IndexError, IndexResult};
pub use index::SearchIndex;
