use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trustline_crypto::{ChainLink, ChainReport, HashChainVerifier};
use trustline_types::{Digest, IdentityHash, RecordId, RecordKind, TrustScore, VerificationKind};

use crate::records::VerificationRecord;

/// Score at or above which an identity counts as high trust in [`LedgerStats`].
pub const HIGH_TRUST_SCORE: u8 = 80;

/// Redacted ledger record: linkage only, no payload or signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicRecord {
    pub id: RecordId,
    pub kind: RecordKind,
    pub timestamp: DateTime<Utc>,
    pub hash: Digest,
    pub previous_hash: Digest,
}

impl ChainLink for PublicRecord {
    fn link_hash(&self) -> Digest {
        self.hash
    }

    fn previous_hash(&self) -> Digest {
        self.previous_hash
    }
}

/// The subset of an identity that is safe to share with other principals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicLedgerEntry {
    pub identity_hash: IdentityHash,
    pub public_key: String,
    pub created_at: DateTime<Utc>,
    pub last_verified: DateTime<Utc>,
    pub trust_score: TrustScore,
    pub verifications: Vec<VerificationRecord>,
    pub transactions: Vec<PublicRecord>,
}

impl PublicLedgerEntry {
    pub fn has_verification(&self, kind: &VerificationKind) -> bool {
        self.verifications.iter().any(|v| &v.kind == kind)
    }

    /// Linkage check over the redacted chain.
    pub fn verify_links(&self) -> ChainReport {
        HashChainVerifier::report_links(&self.transactions)
    }

    pub fn summary(&self) -> TrustSummary {
        TrustSummary {
            identity_hash: self.identity_hash.clone(),
            public_key: self.public_key.clone(),
            trust_score: self.trust_score,
            verification_count: self.verifications.len(),
            verification_types: self.verifications.iter().map(|v| v.kind.clone()).collect(),
            created_at: self.created_at,
            last_verified: self.last_verified,
            transaction_count: self.transactions.len(),
        }
    }
}

/// Compact public trust report for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustSummary {
    pub identity_hash: IdentityHash,
    pub public_key: String,
    pub trust_score: TrustScore,
    pub verification_count: usize,
    pub verification_types: Vec<VerificationKind>,
    pub created_at: DateTime<Utc>,
    pub last_verified: DateTime<Utc>,
    pub transaction_count: usize,
}

/// Public ledger filter. Absent criteria are not applied; present ones are ANDed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub min_trust_score: Option<u8>,
    pub verification_kind: Option<VerificationKind>,
    /// Keep entries created at or after this instant.
    pub created_after: Option<DateTime<Utc>>,
}

impl SearchCriteria {
    pub fn min_trust_score(mut self, score: u8) -> Self {
        self.min_trust_score = Some(score);
        self
    }

    pub fn verification_kind(mut self, kind: VerificationKind) -> Self {
        self.verification_kind = Some(kind);
        self
    }

    pub fn created_after(mut self, at: DateTime<Utc>) -> Self {
        self.created_after = Some(at);
        self
    }

    pub fn matches(&self, entry: &PublicLedgerEntry) -> bool {
        if let Some(min) = self.min_trust_score {
            if entry.trust_score.value() < min {
                return false;
            }
        }
        if let Some(ref kind) = self.verification_kind {
            if !entry.has_verification(kind) {
                return false;
            }
        }
        if let Some(after) = self.created_after {
            if entry.created_at < after {
                return false;
            }
        }
        true
    }
}

/// Aggregate statistics over the public ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_identities: usize,
    /// Mean trust score, rounded half away from zero.
    pub average_trust_score: u8,
    pub total_transactions: usize,
    pub total_verifications: usize,
    pub high_trust_identities: usize,
    pub verified_identities: usize,
}

impl LedgerStats {
    pub fn from_entries(entries: &[PublicLedgerEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let total_score: u64 = entries.iter().map(|e| u64::from(e.trust_score.value())).sum();
        let count = entries.len() as u64;
        Self {
            total_identities: entries.len(),
            average_trust_score: ((total_score * 2 + count) / (count * 2)) as u8,
            total_transactions: entries.iter().map(|e| e.transactions.len()).sum(),
            total_verifications: entries.iter().map(|e| e.verifications.len()).sum(),
            high_trust_identities: entries
                .iter()
                .filter(|e| e.trust_score.value() >= HIGH_TRUST_SCORE)
                .count(),
            verified_identities: entries.iter().filter(|e| !e.verifications.is_empty()).count(),
        }
    }
}
