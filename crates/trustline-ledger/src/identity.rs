use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trustline_crypto::{
    ChainReport, HashChainVerifier, KeyError, KeyPair, PrivateKey, SignatureScheme,
};
use trustline_types::{IdentityHash, TrustScore};

use crate::projection::PublicLedgerEntry;
use crate::records::{LedgerRecord, VerificationRecord};

/// Provenance of an identity: which network minted it and how it signs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMetadata {
    pub version: String,
    pub network: String,
    pub algorithm: String,
    #[serde(default)]
    pub signature_scheme: SignatureScheme,
}

/// A registered principal, including its private key.
///
/// Owned by the issuing context. Only [`Identity::public_entry`] may be
/// written to a store reachable by other principals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub identity_hash: IdentityHash,
    pub public_key: String,
    pub private_key: PrivateKey,
    pub created_at: DateTime<Utc>,
    pub last_verified: DateTime<Utc>,
    pub trust_score: TrustScore,
    pub verifications: Vec<VerificationRecord>,
    pub transactions: Vec<LedgerRecord>,
    pub metadata: IdentityMetadata,
}

impl Identity {
    /// A fresh identity with the initial trust score and an empty chain.
    pub fn new(
        identity_hash: IdentityHash,
        keys: &KeyPair,
        created_at: DateTime<Utc>,
        metadata: IdentityMetadata,
    ) -> Self {
        Self {
            identity_hash,
            public_key: keys.public_key().to_string(),
            private_key: keys.private_key().clone(),
            created_at,
            last_verified: created_at,
            trust_score: TrustScore::INITIAL,
            verifications: Vec::new(),
            transactions: Vec::new(),
            metadata,
        }
    }

    /// Rebuild the key pair from the stored key strings.
    pub fn key_pair(&self) -> Result<KeyPair, KeyError> {
        KeyPair::from_parts(
            self.metadata.signature_scheme,
            self.public_key.clone(),
            self.private_key.clone(),
        )
    }

    /// Last record of the chain.
    pub fn head(&self) -> Option<&LedgerRecord> {
        self.transactions.last()
    }

    /// Full integrity walk over the stored chain.
    pub fn verify_chain(&self) -> ChainReport {
        HashChainVerifier::report(&self.transactions)
    }

    /// Redacted projection for the public ledger.
    pub fn public_entry(&self) -> PublicLedgerEntry {
        PublicLedgerEntry {
            identity_hash: self.identity_hash.clone(),
            public_key: self.public_key.clone(),
            created_at: self.created_at,
            last_verified: self.last_verified,
            trust_score: self.trust_score,
            verifications: self.verifications.clone(),
            transactions: self.transactions.iter().map(LedgerRecord::public).collect(),
        }
    }
}
