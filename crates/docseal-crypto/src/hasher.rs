use docseal_types::ContentHash;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"docseal-blob-v1"`) that is
/// prepended to every hash computation, so a blob and a registry record with
/// identical bytes never share a hash.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for document content blobs.
    pub const BLOB: Self = Self {
        domain: "docseal-blob-v1",
    };
    /// Hasher for persisted document records.
    pub const RECORD: Self = Self {
        domain: "docseal-record-v1",
    };
    /// Hasher for ledger anchor records.
    pub const ANCHOR: Self = Self {
        domain: "docseal-anchor-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut hasher = self.start();
        hasher.update(data);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a serializable value as JSON with domain separation.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<ContentHash, HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    /// Verify that data produces the expected hash.
    pub fn verify(&self, data: &[u8], expected: &ContentHash) -> bool {
        self.hash(data) == *expected
    }

    /// A streaming hasher already primed with this domain tag.
    pub fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
