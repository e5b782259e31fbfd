use docseal_types::ContentHash;

use crate::hasher::ContentHasher;

/// A record that participates in a hash chain.
pub trait ChainLink {
    /// The record's own hash.
    fn link_hash(&self) -> ContentHash;
    /// The previous record's hash (None for genesis).
    fn prev_hash(&self) -> Option<ContentHash>;
    /// Canonical payload bytes covered by the hash.
    fn payload_bytes(&self) -> Vec<u8>;
}

/// Hash chain integrity verifier.
///
/// A chain is valid when every record's `prev_hash` names the record before
/// it and every record's hash is correctly computed from its payload and
/// that previous hash.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a whole chain, stopping at the first broken link.
    pub fn verify_chain(links: &[impl ChainLink]) -> Result<(), ChainError> {
        let mut expected_prev = None;
        for (index, link) in links.iter().enumerate() {
            Self::verify_link(link, expected_prev, index)?;
            expected_prev = Some(link.link_hash());
        }
        Ok(())
    }

    /// Verify a single link against the hash of the record before it.
    pub fn verify_link(
        link: &impl ChainLink,
        expected_prev: Option<ContentHash>,
        index: usize,
    ) -> Result<(), ChainError> {
        match (expected_prev, link.prev_hash()) {
            (None, Some(_)) => return Err(ChainError::GenesisHasPrevHash),
            (Some(_), None) => return Err(ChainError::MissingPrevHash { index }),
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(ChainError::BrokenLink { index })
            }
            _ => {}
        }

        let computed = Self::compute_hash(&link.payload_bytes(), expected_prev);
        if computed != link.link_hash() {
            return Err(ChainError::HashMismatch { index });
        }
        Ok(())
    }

    /// Compute the hash for a payload chained onto an optional previous hash.
    pub fn compute_hash(payload: &[u8], prev_hash: Option<ContentHash>) -> ContentHash {
        let mut hasher = ContentHasher::ANCHOR.start();
        if let Some(prev) = prev_hash {
            hasher.update(prev.as_bytes());
        }
        hasher.update(payload);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("genesis record has a previous hash (should be None)")]
    GenesisHasPrevHash,

    #[error("broken link at index {index}: prev_hash does not match")]
    BrokenLink { index: usize },

    #[error("missing prev_hash at index {index} (should reference previous record)")]
    MissingPrevHash { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },
}
