use trustline_types::Digest;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a record and a verification payload with identical bytes
/// produce different digests.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for identity hash minting.
    pub const IDENTITY: Self = Self {
        domain: "trustline-identity-v1",
    };
    /// Hasher for ledger record content.
    pub const RECORD: Self = Self {
        domain: "trustline-record-v1",
    };
    /// Hasher for record ids.
    pub const RECORD_ID: Self = Self {
        domain: "trustline-record-id-v1",
    };
    /// Hasher for verification payloads.
    pub const VERIFICATION: Self = Self {
        domain: "trustline-verification-v1",
    };
    /// Hasher for simulated signatures.
    pub const SIGNATURE: Self = Self {
        domain: "trustline-signature-v1",
    };
    /// Hasher for key derivation.
    pub const KEY: Self = Self {
        domain: "trustline-key-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash several byte slices as one message.
    pub fn hash_parts(&self, parts: &[&[u8]]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(part);
        }
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a serializable value through its canonical JSON encoding.
    ///
    /// `serde_json` without `preserve_order` emits map keys in sorted order,
    /// so equal values always encode to equal bytes.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<Digest, HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &Digest) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// 16 random bytes from the thread CSPRNG.
pub fn random_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    rand::Rng::fill(&mut rand::thread_rng(), &mut salt);
    salt
}

/// Errors from hashing operations.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
