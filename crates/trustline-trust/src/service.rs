use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use trustline_crypto::{
    random_salt, ChainError, ChainReport, ContentHasher, HashChainVerifier, KeyPair,
};
use trustline_ledger::{
    ChainWriter, Identity, IdentityMetadata, IdentityVault, LedgerError, LedgerStats,
    PrincipalIndex, PublicLedgerEntry, PublicLedgerStore, SearchCriteria, StoreError,
    TrustSummary, VerificationRecord,
};
use trustline_types::{IdentityHash, PrincipalData, RecordKind, TrustScore, VerificationKind};

use crate::config::TrustConfig;
use crate::error::{TrustError, TrustResult};
use crate::locks::KeyedLocks;
use crate::policy::trust_delta;

/// Successful verification of an identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verified: bool,
    pub trust_score: TrustScore,
    pub verified_at: DateTime<Utc>,
}

/// Identity creation, evidence, verification and public queries.
///
/// Every mutation of an identity runs under that identity's entry in a
/// [`KeyedLocks`] table, so at most one append per identity is in flight.
/// Creation with a principal index additionally locks the principal id.
pub struct TrustService {
    config: TrustConfig,
    ledger: Arc<dyn PublicLedgerStore>,
    vault: Arc<dyn IdentityVault>,
    principals: Option<Arc<dyn PrincipalIndex>>,
    locks: KeyedLocks,
}

impl TrustService {
    pub fn new(
        config: TrustConfig,
        ledger: Arc<dyn PublicLedgerStore>,
        vault: Arc<dyn IdentityVault>,
    ) -> Self {
        Self {
            config,
            ledger,
            vault,
            principals: None,
            locks: KeyedLocks::new(),
        }
    }

    /// Enforce one identity per principal through `index`.
    pub fn with_principal_index(mut self, index: Arc<dyn PrincipalIndex>) -> Self {
        self.principals = Some(index);
        self
    }

    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    // ---- Mutations ----

    /// Mint a new identity for `principal` with a genesis record.
    pub fn create_identity(&self, principal: &PrincipalData) -> TrustResult<Identity> {
        principal.validate()?;
        let Some(index) = self.principals.as_ref() else {
            return self.mint(principal);
        };

        let key = format!("principal:{}", principal.principal_id);
        self.locks.with_lock(&key, || {
            if index.lookup(&principal.principal_id)?.is_some() {
                return Err(TrustError::DuplicateIdentity {
                    principal: principal.principal_id.clone(),
                });
            }
            let identity = self.mint(principal)?;
            index
                .bind(&principal.principal_id, &identity.identity_hash)
                .map_err(|e| match e {
                    StoreError::AlreadyBound { principal } => {
                        TrustError::DuplicateIdentity { principal }
                    }
                    other => other.into(),
                })?;
            Ok(identity)
        })
    }

    fn mint(&self, principal: &PrincipalData) -> TrustResult<Identity> {
        let now = Utc::now();
        let salt = random_salt();
        let digest = ContentHasher::IDENTITY
            .hash_json(&json!({
                "principal": principal,
                "timestamp": now,
                "salt": hex::encode(salt),
                "network": self.config.network_name,
            }))
            .map_err(LedgerError::from)?;
        let identity_hash = IdentityHash::from_digest(digest);

        let scheme = self.config.signature_scheme;
        let keys = KeyPair::derive_with_salt(scheme, &identity_hash, &salt);
        let metadata = IdentityMetadata {
            version: self.config.version.clone(),
            network: self.config.network_name.clone(),
            algorithm: scheme.algorithm().to_string(),
            signature_scheme: scheme,
        };
        let mut identity = Identity::new(identity_hash, &keys, now, metadata);

        self.locks.with_lock(&identity.identity_hash.to_hex(), || {
            ChainWriter::append_record_at(
                &mut identity,
                RecordKind::IdentityCreated,
                json!({ "userId": principal.principal_id, "timestamp": now }),
                now,
            )?;
            self.persist(&identity, None)
        })?;

        info!(
            identity = %identity.identity_hash.short_id(),
            scheme = %scheme,
            "identity created"
        );
        Ok(identity)
    }

    /// Attach verification evidence and raise the trust score.
    pub fn add_verification(
        &self,
        identity_hash: &IdentityHash,
        kind: VerificationKind,
        data: Value,
    ) -> TrustResult<Identity> {
        if self.config.strict_verification_types && !kind.is_known() {
            return Err(TrustError::InvalidVerificationType(kind.as_str().to_string()));
        }

        self.locks.with_lock(&identity_hash.to_hex(), || {
            let mut identity = self
                .vault
                .load(identity_hash)?
                .ok_or_else(|| TrustError::NotFound(identity_hash.to_hex()))?;

            let previous = identity.clone();

            let now = Utc::now();
            let before = identity.trust_score;
            identity.trust_score = before.raise(trust_delta(&kind));
            let score = identity.trust_score.value();
            let record =
                VerificationRecord::new(kind.clone(), data, now).map_err(LedgerError::from)?;
            identity.verifications.push(record);
            ChainWriter::append_record_at(
                &mut identity,
                RecordKind::VerificationAdded,
                json!({ "verificationType": kind.as_str(), "trustScore": score }),
                now,
            )?;
            self.persist(&identity, Some(&previous))?;

            info!(
                identity = %identity_hash.short_id(),
                kind = %kind,
                from = before.value(),
                to = score,
                "verification added"
            );
            Ok(identity)
        })
    }

    /// Login-time check of score and chain integrity.
    ///
    /// Owner-held identities get the full check (content hashes and
    /// signatures), and on success `last_verified` is refreshed in both
    /// stores. Identities only present in the public ledger get a
    /// linkage-only check and nothing is written: the entry belongs to its
    /// owner, whose writes this service does not serialize with.
    pub fn verify_identity(
        &self,
        identity_hash: &IdentityHash,
    ) -> TrustResult<VerificationOutcome> {
        self.locks.with_lock(&identity_hash.to_hex(), || {
            let now = Utc::now();
            if let Some(mut identity) = self.vault.load(identity_hash)? {
                self.check_threshold(identity.trust_score)?;
                HashChainVerifier::verify_chain(&identity.transactions).map_err(compromised)?;
                ChainWriter::verify_signatures(&identity).map_err(|e| match e {
                    LedgerError::Chain(e) => compromised(e),
                    other => other.into(),
                })?;
                let previous = identity.clone();
                identity.last_verified = now;
                self.persist(&identity, Some(&previous))?;
                debug!(identity = %identity_hash.short_id(), "verified owner-held identity");
                return Ok(VerificationOutcome {
                    verified: true,
                    trust_score: identity.trust_score,
                    verified_at: now,
                });
            }

            let entry = self
                .ledger
                .get(identity_hash)?
                .ok_or_else(|| TrustError::NotFound(identity_hash.to_hex()))?;
            self.check_threshold(entry.trust_score)?;
            HashChainVerifier::verify_links(&entry.transactions).map_err(compromised)?;
            debug!(identity = %identity_hash.short_id(), "verified public identity (links only)");
            Ok(VerificationOutcome {
                verified: true,
                trust_score: entry.trust_score,
                verified_at: now,
            })
        })
    }

    // ---- Queries ----

    /// Redacted projection of one identity.
    pub fn get_public_trust_score(
        &self,
        identity_hash: &IdentityHash,
    ) -> TrustResult<PublicLedgerEntry> {
        self.ledger
            .get(identity_hash)?
            .ok_or_else(|| TrustError::NotFound(identity_hash.to_hex()))
    }

    pub fn trust_summary(&self, identity_hash: &IdentityHash) -> TrustResult<TrustSummary> {
        Ok(self.get_public_trust_score(identity_hash)?.summary())
    }

    /// Entries matching every present criterion, ordered by
    /// `(created_at, identity_hash)`.
    pub fn search_ledger(&self, criteria: &SearchCriteria) -> TrustResult<Vec<PublicLedgerEntry>> {
        let mut hits: Vec<_> = self
            .ledger
            .entries()?
            .into_iter()
            .filter(|e| criteria.matches(e))
            .collect();
        hits.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.identity_hash.cmp(&b.identity_hash))
        });
        Ok(hits)
    }

    pub fn ledger_stats(&self) -> TrustResult<LedgerStats> {
        Ok(LedgerStats::from_entries(&self.ledger.entries()?))
    }

    /// Chain report without threshold checks or side effects.
    ///
    /// Uses the full chain and signatures when the vault holds the identity,
    /// the public linkage otherwise.
    pub fn audit_chain(&self, identity_hash: &IdentityHash) -> TrustResult<ChainReport> {
        if let Some(identity) = self.vault.load(identity_hash)? {
            let length = identity.transactions.len();
            let mut result = HashChainVerifier::verify_chain(&identity.transactions);
            if result.is_ok() {
                result = match ChainWriter::verify_signatures(&identity) {
                    Ok(()) => Ok(()),
                    Err(LedgerError::Chain(e)) => Err(e),
                    Err(other) => return Err(other.into()),
                };
            }
            return Ok(ChainReport::from_result(length, result));
        }
        Ok(self.get_public_trust_score(identity_hash)?.verify_links())
    }

    fn check_threshold(&self, score: TrustScore) -> TrustResult<()> {
        if score.value() < self.config.trust_threshold {
            return Err(TrustError::BelowThreshold {
                score: score.value(),
                threshold: self.config.trust_threshold,
            });
        }
        Ok(())
    }

    /// Write the vault copy, then the public projection.
    ///
    /// If the public write fails the vault is put back to `previous`, or the
    /// identity is dropped from it when there was no previous state.
    fn persist(&self, identity: &Identity, previous: Option<&Identity>) -> TrustResult<()> {
        self.vault.store(identity)?;
        let Err(e) = self.ledger.put(&identity.public_entry()) else {
            return Ok(());
        };
        let short = identity.identity_hash.short_id();
        warn!(identity = %short, error = %e, "public ledger write failed");

        let restored = match previous {
            Some(previous) => self.vault.store(previous),
            None => self.vault.remove(&identity.identity_hash).map(|_| ()),
        };
        if let Err(undo) = restored {
            warn!(identity = %short, error = %undo, "vault rollback failed");
        }
        Err(e.into())
    }
}

fn compromised(e: ChainError) -> TrustError {
    warn!(index = e.index(), reason = %e.reason(), "chain verification failed");
    TrustError::ChainCompromised {
        index: e.index(),
        reason: e.reason(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;
    use trustline_crypto::{BreakReason, SignatureScheme};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use trustline_ledger::{
        InMemoryPrincipalIndex, InMemoryPublicLedger, InMemoryVault, JsonFileStore, StoreResult,
    };

    struct Harness {
        service: TrustService,
        ledger: Arc<InMemoryPublicLedger>,
        vault: Arc<InMemoryVault>,
    }

    fn harness_with(config: TrustConfig) -> Harness {
        let ledger = Arc::new(InMemoryPublicLedger::new());
        let vault = Arc::new(InMemoryVault::new());
        let service = TrustService::new(config, ledger.clone(), vault.clone());
        Harness { service, ledger, vault }
    }

    fn harness() -> Harness {
        harness_with(TrustConfig::default())
    }

    fn alice() -> PrincipalData {
        PrincipalData::email("a@b.com")
    }

    #[test]
    fn create_identity_starts_at_fifty_with_genesis() {
        let h = harness();
        let id = h.service.create_identity(&alice()).unwrap();

        assert_eq!(id.trust_score.value(), 50);
        assert_eq!(id.transactions.len(), 1);
        assert_eq!(id.transactions[0].kind, RecordKind::IdentityCreated);
        assert!(id.transactions[0].is_genesis());
        assert_eq!(id.transactions[0].data["userId"], "a@b.com");
        assert!(id.verify_chain().valid);
        assert_eq!(id.metadata.network, "Trustline Network");

        assert_eq!(h.vault.load(&id.identity_hash).unwrap(), Some(id.clone()));
        assert_eq!(h.ledger.get(&id.identity_hash).unwrap(), Some(id.public_entry()));
    }

    #[test]
    fn identity_hashes_differ_for_same_principal() {
        let h = harness();
        let a = h.service.create_identity(&alice()).unwrap();
        let b = h.service.create_identity(&alice()).unwrap();
        assert_ne!(a.identity_hash, b.identity_hash);
    }

    #[test]
    fn blank_principal_rejected() {
        let h = harness();
        let err = h.service.create_identity(&PrincipalData::email("  ")).unwrap_err();
        assert!(matches!(err, TrustError::InvalidPrincipal(_)));
    }

    #[test]
    fn government_id_scenario_caps_at_hundred() {
        let h = harness();
        let hash = h.service.create_identity(&alice()).unwrap().identity_hash;

        let id = h
            .service
            .add_verification(&hash, VerificationKind::GovernmentId, json!({"doc": "P123"}))
            .unwrap();
        assert_eq!(id.trust_score.value(), 75);
        assert_eq!(id.transactions.len(), 2);
        assert_eq!(id.transactions[1].kind, RecordKind::VerificationAdded);
        assert_eq!(id.transactions[1].data["verificationType"], "GOVERNMENT_ID");
        assert_eq!(id.transactions[1].data["trustScore"], 75);

        let id = h
            .service
            .add_verification(&hash, VerificationKind::GovernmentId, json!({}))
            .unwrap();
        assert_eq!(id.trust_score.value(), 100);

        let id = h
            .service
            .add_verification(&hash, VerificationKind::GovernmentId, json!({}))
            .unwrap();
        assert_eq!(id.trust_score.value(), 100);
        assert_eq!(id.transactions.len(), 4);
        assert_eq!(id.verifications.len(), 3);
        assert!(id.verify_chain().valid);

        let public = h.service.get_public_trust_score(&hash).unwrap();
        assert_eq!(public.trust_score.value(), 100);
        assert!(public.verify_links().valid);
    }

    #[test]
    fn unknown_kind_gets_default_bump() {
        let h = harness();
        let hash = h.service.create_identity(&alice()).unwrap().identity_hash;
        let id = h
            .service
            .add_verification(&hash, VerificationKind::from("DNA_SAMPLE"), json!({}))
            .unwrap();
        assert_eq!(id.trust_score.value(), 55);
        assert_eq!(id.verifications[0].kind.as_str(), "DNA_SAMPLE");
    }

    #[test]
    fn strict_mode_rejects_unknown_kind() {
        let h = harness_with(TrustConfig {
            strict_verification_types: true,
            ..TrustConfig::default()
        });
        let hash = h.service.create_identity(&alice()).unwrap().identity_hash;
        let err = h
            .service
            .add_verification(&hash, VerificationKind::from("DNA_SAMPLE"), json!({}))
            .unwrap_err();
        assert!(matches!(err, TrustError::InvalidVerificationType(ref k) if k == "DNA_SAMPLE"));
        assert_eq!(h.vault.load(&hash).unwrap().unwrap().transactions.len(), 1);
    }

    #[test]
    fn add_verification_unknown_identity() {
        let h = harness();
        let err = h
            .service
            .add_verification(
                &IdentityHash::ephemeral(),
                VerificationKind::EmailVerified,
                json!({}),
            )
            .unwrap_err();
        assert!(matches!(err, TrustError::NotFound(_)));
    }

    #[test]
    fn verify_unknown_identity_is_not_found() {
        let h = harness();
        let err = h.service.verify_identity(&IdentityHash::ephemeral()).unwrap_err();
        assert!(matches!(err, TrustError::NotFound(_)));
        assert!(err.is_rejection());
    }

    #[test]
    fn verify_refreshes_last_verified() {
        let h = harness();
        let id = h.service.create_identity(&alice()).unwrap();
        let outcome = h.service.verify_identity(&id.identity_hash).unwrap();

        assert!(outcome.verified);
        assert_eq!(outcome.trust_score.value(), 50);
        let stored = h.vault.load(&id.identity_hash).unwrap().unwrap();
        assert_eq!(stored.last_verified, outcome.verified_at);
        assert_eq!(stored.transactions.len(), 1);
        let public = h.ledger.get(&id.identity_hash).unwrap().unwrap();
        assert_eq!(public.last_verified, outcome.verified_at);
    }

    #[test]
    fn lock_table_is_empty_between_calls() {
        let h = harness();
        for _ in 0..1000 {
            let _ = h.service.verify_identity(&IdentityHash::ephemeral());
        }
        let hash = h.service.create_identity(&alice()).unwrap().identity_hash;
        h.service
            .add_verification(&hash, VerificationKind::EmailVerified, json!({}))
            .unwrap();
        h.service.verify_identity(&hash).unwrap();
        assert!(h.service.locks.is_empty());
    }

    #[test]
    fn verify_below_threshold() {
        let h = harness();
        let mut id = h.service.create_identity(&alice()).unwrap();
        id.trust_score = TrustScore::new(40).unwrap();
        h.vault.store(&id).unwrap();
        h.ledger.put(&id.public_entry()).unwrap();

        let err = h.service.verify_identity(&id.identity_hash).unwrap_err();
        assert!(matches!(err, TrustError::BelowThreshold { score: 40, threshold: 50 }));
        assert!(err.is_rejection());
    }

    #[test]
    fn verify_detects_tampered_payload() {
        let h = harness();
        let hash = h.service.create_identity(&alice()).unwrap().identity_hash;
        h.service
            .add_verification(&hash, VerificationKind::EmailVerified, json!({}))
            .unwrap();
        h.service
            .add_verification(&hash, VerificationKind::PhoneVerified, json!({}))
            .unwrap();

        let mut id = h.vault.load(&hash).unwrap().unwrap();
        id.transactions[1].data = json!({"verificationType": "GOVERNMENT_ID", "trustScore": 100});
        h.vault.store(&id).unwrap();

        let err = h.service.verify_identity(&hash).unwrap_err();
        assert!(matches!(
            err,
            TrustError::ChainCompromised { index: 1, reason: BreakReason::HashMismatch }
        ));
        let report = h.service.audit_chain(&hash).unwrap();
        assert_eq!(report.broken_at, Some(1));
    }

    #[test]
    fn verify_detects_reordered_records() {
        let h = harness();
        let hash = h.service.create_identity(&alice()).unwrap().identity_hash;
        for _ in 0..3 {
            h.service
                .add_verification(&hash, VerificationKind::SocialVerified, json!({}))
                .unwrap();
        }
        let mut id = h.vault.load(&hash).unwrap().unwrap();
        id.transactions.swap(2, 3);
        h.vault.store(&id).unwrap();

        let err = h.service.verify_identity(&hash).unwrap_err();
        assert!(matches!(
            err,
            TrustError::ChainCompromised { index: 2, reason: BreakReason::BrokenLink }
        ));
    }

    #[test]
    fn verify_detects_forged_signature() {
        let h = harness();
        let hash = h.service.create_identity(&alice()).unwrap().identity_hash;
        let mut id = h.vault.load(&hash).unwrap().unwrap();
        id.transactions[0].signature = "f".repeat(64);
        h.vault.store(&id).unwrap();

        let err = h.service.verify_identity(&hash).unwrap_err();
        assert!(matches!(
            err,
            TrustError::ChainCompromised { index: 0, reason: BreakReason::SignatureMismatch }
        ));
    }

    #[test]
    fn public_only_identity_verifies_links() {
        let source = harness();
        let hash = source.service.create_identity(&alice()).unwrap().identity_hash;
        source
            .service
            .add_verification(&hash, VerificationKind::EmailVerified, json!({}))
            .unwrap();

        // A second service sharing the public ledger but not the vault.
        let other = TrustService::new(
            TrustConfig::default(),
            source.ledger.clone(),
            Arc::new(InMemoryVault::new()),
        );
        let before = source.ledger.get(&hash).unwrap().unwrap();
        let outcome = other.verify_identity(&hash).unwrap();
        assert_eq!(outcome.trust_score.value(), 60);
        assert_eq!(source.ledger.get(&hash).unwrap().unwrap(), before);

        let mut entry = source.ledger.get(&hash).unwrap().unwrap();
        entry.transactions[1].previous_hash = entry.transactions[1].hash;
        source.ledger.put(&entry).unwrap();
        let err = other.verify_identity(&hash).unwrap_err();
        assert!(matches!(
            err,
            TrustError::ChainCompromised { index: 1, reason: BreakReason::BrokenLink }
        ));
    }

    /// Public ledger that runs a hook right after serving a read.
    struct InterleavingLedger {
        inner: Arc<InMemoryPublicLedger>,
        after_get: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    }

    impl PublicLedgerStore for InterleavingLedger {
        fn get(&self, identity: &IdentityHash) -> StoreResult<Option<PublicLedgerEntry>> {
            let entry = self.inner.get(identity)?;
            if let Some(hook) = self.after_get.lock().unwrap().take() {
                hook();
            }
            Ok(entry)
        }

        fn put(&self, entry: &PublicLedgerEntry) -> StoreResult<()> {
            self.inner.put(entry)
        }

        fn entries(&self) -> StoreResult<Vec<PublicLedgerEntry>> {
            self.inner.entries()
        }
    }

    #[test]
    fn public_only_verify_keeps_concurrent_owner_update() {
        let owner = Arc::new(harness());
        let hash = owner.service.create_identity(&alice()).unwrap().identity_hash;

        let writer = Arc::clone(&owner);
        let target = hash.clone();
        let hook: Box<dyn FnOnce() + Send> = Box::new(move || {
            writer
                .service
                .add_verification(&target, VerificationKind::GovernmentId, json!({}))
                .unwrap();
        });
        let ledger = InterleavingLedger {
            inner: owner.ledger.clone(),
            after_get: Mutex::new(Some(hook)),
        };
        let verifier = TrustService::new(
            TrustConfig::default(),
            Arc::new(ledger),
            Arc::new(InMemoryVault::new()),
        );

        // The verifier saw the pre-update snapshot.
        assert_eq!(verifier.verify_identity(&hash).unwrap().trust_score.value(), 50);

        let public = owner.ledger.get(&hash).unwrap().unwrap();
        assert_eq!(public.trust_score.value(), 75);
        assert_eq!(public.transactions.len(), 2);
        assert_eq!(public, owner.vault.load(&hash).unwrap().unwrap().public_entry());
    }

    /// Public ledger whose writes fail while `fail` is set.
    #[derive(Default)]
    struct FlakyLedger {
        inner: InMemoryPublicLedger,
        fail: AtomicBool,
    }

    impl PublicLedgerStore for FlakyLedger {
        fn get(&self, identity: &IdentityHash) -> StoreResult<Option<PublicLedgerEntry>> {
            self.inner.get(identity)
        }

        fn put(&self, entry: &PublicLedgerEntry) -> StoreResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.put(entry)
        }

        fn entries(&self) -> StoreResult<Vec<PublicLedgerEntry>> {
            self.inner.entries()
        }
    }

    #[test]
    fn failed_public_write_rolls_back_verification() {
        let ledger = Arc::new(FlakyLedger::default());
        let vault = Arc::new(InMemoryVault::new());
        let service = TrustService::new(TrustConfig::default(), ledger.clone(), vault.clone());
        let hash = service.create_identity(&alice()).unwrap().identity_hash;
        let original = vault.load(&hash).unwrap().unwrap();

        ledger.fail.store(true, Ordering::SeqCst);
        let err = service
            .add_verification(&hash, VerificationKind::GovernmentId, json!({}))
            .unwrap_err();
        assert!(matches!(err, TrustError::Store(StoreError::Io(_))));
        assert!(!err.is_rejection());
        assert_eq!(vault.load(&hash).unwrap().unwrap(), original);
        assert!(service.verify_identity(&hash).is_err());
        assert_eq!(vault.load(&hash).unwrap().unwrap(), original);

        ledger.fail.store(false, Ordering::SeqCst);
        let id = service
            .add_verification(&hash, VerificationKind::GovernmentId, json!({}))
            .unwrap();
        assert_eq!(id.trust_score.value(), 75);
        assert_eq!(id.transactions.len(), 2);
        assert_eq!(ledger.get(&hash).unwrap().unwrap(), id.public_entry());
    }

    #[test]
    fn failed_public_write_leaves_no_vault_orphan() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open_store(dir.path()));
        let ledger = Arc::new(FlakyLedger::default());
        ledger.fail.store(true, Ordering::SeqCst);
        let service = TrustService::new(TrustConfig::default(), ledger.clone(), store.clone())
            .with_principal_index(store.clone());

        assert!(service.create_identity(&alice()).is_err());
        let vault_files = std::fs::read_dir(dir.path().join("vault")).unwrap().count();
        assert_eq!(vault_files, 0);
        assert_eq!(store.lookup("a@b.com").unwrap(), None);
        assert_eq!(ledger.len().unwrap(), 0);

        ledger.fail.store(false, Ordering::SeqCst);
        assert!(service.create_identity(&alice()).is_ok());
    }

    #[test]
    fn public_reads_are_idempotent() {
        let h = harness();
        let hash = h.service.create_identity(&alice()).unwrap().identity_hash;
        let a = h.service.get_public_trust_score(&hash).unwrap();
        let b = h.service.get_public_trust_score(&hash).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn trust_summary_counts() {
        let h = harness();
        let hash = h.service.create_identity(&alice()).unwrap().identity_hash;
        h.service
            .add_verification(&hash, VerificationKind::Biometric, json!({}))
            .unwrap();
        let summary = h.service.trust_summary(&hash).unwrap();
        assert_eq!(summary.trust_score.value(), 65);
        assert_eq!(summary.verification_count, 1);
        assert_eq!(summary.verification_types, vec![VerificationKind::Biometric]);
        assert_eq!(summary.transaction_count, 2);
    }

    #[test]
    fn duplicate_principal_rejected_with_index() {
        let ledger = Arc::new(InMemoryPublicLedger::new());
        let vault = Arc::new(InMemoryVault::new());
        let service = TrustService::new(TrustConfig::default(), ledger.clone(), vault)
            .with_principal_index(Arc::new(InMemoryPrincipalIndex::new()));

        service.create_identity(&alice()).unwrap();
        let err = service.create_identity(&alice()).unwrap_err();
        assert!(matches!(
            err,
            TrustError::DuplicateIdentity { ref principal } if principal == "a@b.com"
        ));
        assert_eq!(ledger.len().unwrap(), 1);
        service
            .create_identity(&PrincipalData::email("c@d.com"))
            .unwrap();
    }

    #[test]
    fn search_filters_and_orders() {
        let h = harness();
        let a = h.service.create_identity(&alice()).unwrap();
        let b = h.service.create_identity(&PrincipalData::email("b@c.com")).unwrap();
        let c = h.service.create_identity(&PrincipalData::email("c@d.com")).unwrap();
        h.service
            .add_verification(&b.identity_hash, VerificationKind::GovernmentId, json!({}))
            .unwrap();
        h.service
            .add_verification(&c.identity_hash, VerificationKind::EmailVerified, json!({}))
            .unwrap();

        let all = h.service.search_ledger(&SearchCriteria::default()).unwrap();
        assert_eq!(all.len(), 3);
        for pair in all.windows(2) {
            assert!(
                (pair[0].created_at, &pair[0].identity_hash)
                    <= (pair[1].created_at, &pair[1].identity_hash)
            );
        }

        let high = h
            .service
            .search_ledger(&SearchCriteria::default().min_trust_score(60))
            .unwrap();
        let hashes: Vec<_> = high.iter().map(|e| e.identity_hash.clone()).collect();
        assert_eq!(hashes.len(), 2);
        assert!(!hashes.contains(&a.identity_hash));

        let gov = h
            .service
            .search_ledger(
                &SearchCriteria::default()
                    .min_trust_score(60)
                    .verification_kind(VerificationKind::GovernmentId),
            )
            .unwrap();
        assert_eq!(gov.len(), 1);
        assert_eq!(gov[0].identity_hash, b.identity_hash);

        let later = h
            .service
            .search_ledger(&SearchCriteria::default().created_after(c.created_at))
            .unwrap();
        assert!(later.iter().any(|e| e.identity_hash == c.identity_hash));
    }

    #[test]
    fn ledger_stats_aggregate() {
        let h = harness();
        assert_eq!(h.service.ledger_stats().unwrap(), LedgerStats::default());

        let a = h.service.create_identity(&alice()).unwrap();
        h.service.create_identity(&PrincipalData::email("b@c.com")).unwrap();
        h.service
            .add_verification(&a.identity_hash, VerificationKind::GovernmentId, json!({}))
            .unwrap();
        h.service
            .add_verification(&a.identity_hash, VerificationKind::Biometric, json!({}))
            .unwrap();

        let stats = h.service.ledger_stats().unwrap();
        assert_eq!(stats.total_identities, 2);
        // (90 + 50) / 2
        assert_eq!(stats.average_trust_score, 70);
        assert_eq!(stats.total_transactions, 4);
        assert_eq!(stats.total_verifications, 2);
        assert_eq!(stats.high_trust_identities, 1);
        assert_eq!(stats.verified_identities, 1);
    }

    #[test]
    fn concurrent_verifications_keep_chain_linear() {
        let h = harness();
        let hash = h.service.create_identity(&alice()).unwrap().identity_hash;
        let service = Arc::new(h.service);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                let hash = hash.clone();
                thread::spawn(move || {
                    service
                        .add_verification(
                            &hash,
                            VerificationKind::SocialVerified,
                            json!({ "n": i }),
                        )
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let id = h.vault.load(&hash).unwrap().unwrap();
        assert_eq!(id.transactions.len(), 9);
        assert_eq!(id.trust_score.value(), 90);
        assert!(id.verify_chain().valid);
        assert!(service.verify_identity(&hash).is_ok());
    }

    #[test]
    fn ed25519_identities_verify() {
        let h = harness_with(TrustConfig {
            signature_scheme: SignatureScheme::Ed25519,
            ..TrustConfig::default()
        });
        let id = h.service.create_identity(&alice()).unwrap();
        assert!(id.public_key.starts_with("ed25519_pub_"));
        assert_eq!(id.metadata.signature_scheme, SignatureScheme::Ed25519);
        h.service
            .add_verification(&id.identity_hash, VerificationKind::EmailVerified, json!({}))
            .unwrap();
        assert!(h.service.verify_identity(&id.identity_hash).is_ok());
        assert!(h.service.audit_chain(&id.identity_hash).unwrap().valid);
    }

    #[test]
    fn file_store_backed_service() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open_store(dir.path()));
        let service = TrustService::new(TrustConfig::default(), store.clone(), store.clone())
            .with_principal_index(store.clone());

        let hash = service.create_identity(&alice()).unwrap().identity_hash;
        service
            .add_verification(&hash, VerificationKind::IdentityDocument, json!({}))
            .unwrap();
        assert!(matches!(
            service.create_identity(&alice()),
            Err(TrustError::DuplicateIdentity { .. })
        ));

        let reopened = Arc::new(open_store(dir.path()));
        let service = TrustService::new(TrustConfig::default(), reopened.clone(), reopened);
        let outcome = service.verify_identity(&hash).unwrap();
        assert_eq!(outcome.trust_score.value(), 70);
    }

    fn open_store(dir: &std::path::Path) -> JsonFileStore {
        JsonFileStore::open(dir, "Trustline Network", "1.0.0").unwrap()
    }

    fn kind_strategy() -> impl Strategy<Value = VerificationKind> {
        prop_oneof![
            prop::sample::select(VerificationKind::KNOWN.to_vec()),
            "[A-Z_]{3,12}".prop_map(VerificationKind::from),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn score_is_bounded_and_monotonic(
            kinds in prop::collection::vec(kind_strategy(), 0..12),
        ) {
            let h = harness();
            let hash = h.service.create_identity(&alice()).unwrap().identity_hash;
            let mut last = 50u8;
            for kind in kinds {
                let id = h.service.add_verification(&hash, kind, json!({})).unwrap();
                let score = id.trust_score.value();
                prop_assert!(score >= last);
                prop_assert!(score <= 100);
                last = score;
            }
            prop_assert!(h.vault.load(&hash).unwrap().unwrap().verify_chain().valid);
        }
    }
}
