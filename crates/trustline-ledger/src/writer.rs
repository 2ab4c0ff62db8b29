use chrono::{DateTime, Utc};
use serde_json::Value;
use trustline_crypto::{random_salt, ChainError, ContentHasher};
use trustline_types::{Digest, RecordId, RecordKind};

use crate::error::LedgerError;
use crate::identity::Identity;
use crate::records::LedgerRecord;

/// Appends signed records to an identity's chain.
///
/// Appends take `&mut Identity`, so a single call has exclusive access to the
/// chain tail. Callers that load identities from shared storage must also
/// serialize the load-append-store cycle per identity.
pub struct ChainWriter;

impl ChainWriter {
    /// Append a record stamped with the current time.
    pub fn append_record(
        identity: &mut Identity,
        kind: RecordKind,
        data: Value,
    ) -> Result<LedgerRecord, LedgerError> {
        Self::append_record_at(identity, kind, data, Utc::now())
    }

    /// Append a record with an explicit timestamp.
    ///
    /// The timestamp is informational; chain order is the append order.
    pub fn append_record_at(
        identity: &mut Identity,
        kind: RecordKind,
        data: Value,
        timestamp: DateTime<Utc>,
    ) -> Result<LedgerRecord, LedgerError> {
        let keys = identity.key_pair()?;
        let previous_hash = identity
            .head()
            .map(|r| r.hash)
            .unwrap_or(Digest::GENESIS);

        let mut record = LedgerRecord {
            id: Self::record_id(&timestamp, &previous_hash),
            kind,
            identity_hash: identity.identity_hash.clone(),
            timestamp,
            data,
            previous_hash,
            hash: Digest::GENESIS,
            signature: String::new(),
        };
        record.hash = record.content_hash()?;
        record.signature = keys.sign(&record.hash)?;

        identity.transactions.push(record.clone());
        tracing::debug!(
            identity = %identity.identity_hash.short_id(),
            record = %record.id.short_id(),
            kind = %kind,
            len = identity.transactions.len(),
            "appended ledger record"
        );
        Ok(record)
    }

    /// Check every record's signature against the identity's key pair.
    pub fn verify_signatures(identity: &Identity) -> Result<(), LedgerError> {
        let keys = identity.key_pair()?;
        for (index, record) in identity.transactions.iter().enumerate() {
            if keys.verify(&record.hash, &record.signature).is_err() {
                return Err(ChainError::SignatureMismatch { index }.into());
            }
        }
        Ok(())
    }

    fn record_id(timestamp: &DateTime<Utc>, previous_hash: &Digest) -> RecordId {
        let millis = timestamp.timestamp_millis().to_be_bytes();
        let salt = random_salt();
        RecordId::from_digest(ContentHasher::RECORD_ID.hash_parts(&[
            millis.as_slice(),
            salt.as_slice(),
            previous_hash.as_bytes().as_slice(),
        ]))
    }
}
