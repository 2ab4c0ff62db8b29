use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trustline_crypto::{ChainLink, ContentHasher, HashedLink, HasherError};
use trustline_types::{Digest, IdentityHash, RecordId, RecordKind, VerificationKind};

use crate::projection::PublicRecord;

/// One link in an identity's hash chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: RecordId,
    pub kind: RecordKind,
    pub identity_hash: IdentityHash,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
    /// Hash of the previous record, or [`Digest::GENESIS`] for the first one.
    pub previous_hash: Digest,
    /// Digest over every field above.
    pub hash: Digest,
    /// Binding of `hash` to the identity's private key.
    pub signature: String,
}

/// The hashed portion of a record: everything except `hash` and `signature`.
#[derive(Serialize)]
struct RecordContent<'a> {
    id: &'a RecordId,
    kind: RecordKind,
    identity_hash: &'a IdentityHash,
    timestamp: &'a DateTime<Utc>,
    data: &'a Value,
    previous_hash: &'a Digest,
}

impl LedgerRecord {
    /// Digest of the record's content.
    pub fn content_hash(&self) -> Result<Digest, HasherError> {
        ContentHasher::RECORD.hash_json(&RecordContent {
            id: &self.id,
            kind: self.kind,
            identity_hash: &self.identity_hash,
            timestamp: &self.timestamp,
            data: &self.data,
            previous_hash: &self.previous_hash,
        })
    }

    /// Redacted copy for the public ledger (no payload, no signature).
    pub fn public(&self) -> PublicRecord {
        PublicRecord {
            id: self.id.clone(),
            kind: self.kind,
            timestamp: self.timestamp,
            hash: self.hash,
            previous_hash: self.previous_hash,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_hash.is_genesis()
    }
}

impl ChainLink for LedgerRecord {
    fn link_hash(&self) -> Digest {
        self.hash
    }

    fn previous_hash(&self) -> Digest {
        self.previous_hash
    }
}

impl HashedLink for LedgerRecord {
    fn recompute_hash(&self) -> Result<Digest, HasherError> {
        self.content_hash()
    }
}

/// An evidentiary event attached to an identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub kind: VerificationKind,
    pub verified_at: DateTime<Utc>,
    pub data: Value,
    /// Digest of `data`.
    pub hash: Digest,
}

impl VerificationRecord {
    pub fn new(
        kind: VerificationKind,
        data: Value,
        verified_at: DateTime<Utc>,
    ) -> Result<Self, HasherError> {
        let hash = ContentHasher::VERIFICATION.hash_json(&data)?;
        Ok(Self {
            kind,
            verified_at,
            data,
            hash,
        })
    }

    /// Returns `true` if `hash` still matches `data`.
    pub fn verify_hash(&self) -> bool {
        ContentHasher::VERIFICATION
            .hash_json(&self.data)
            .map(|h| h == self.hash)
            .unwrap_or(false)
    }
}
