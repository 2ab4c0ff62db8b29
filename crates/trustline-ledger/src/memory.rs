//! In-memory stores for tests and single-process use.
//!
//! Each store keeps its data in a `HashMap` behind a `RwLock`. Data is lost
//! when the store is dropped.

use std::collections::HashMap;
use std::sync::RwLock;

use trustline_types::IdentityHash;

use crate::error::{StoreError, StoreResult};
use crate::identity::Identity;
use crate::projection::PublicLedgerEntry;
use crate::traits::{IdentityVault, PrincipalIndex, PublicLedgerStore};

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::LockPoisoned(e.to_string())
}

/// In-memory [`PublicLedgerStore`].
#[derive(Debug, Default)]
pub struct InMemoryPublicLedger {
    entries: RwLock<HashMap<IdentityHash, PublicLedgerEntry>>,
}

impl InMemoryPublicLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PublicLedgerStore for InMemoryPublicLedger {
    fn get(&self, identity: &IdentityHash) -> StoreResult<Option<PublicLedgerEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(identity).cloned())
    }

    fn put(&self, entry: &PublicLedgerEntry) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(entry.identity_hash.clone(), entry.clone());
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<PublicLedgerEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.values().cloned().collect())
    }

    fn contains(&self, identity: &IdentityHash) -> StoreResult<bool> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.contains_key(identity))
    }

    fn len(&self) -> StoreResult<usize> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.len())
    }
}

/// In-memory [`IdentityVault`].
#[derive(Debug, Default)]
pub struct InMemoryVault {
    identities: RwLock<HashMap<IdentityHash, Identity>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityVault for InMemoryVault {
    fn load(&self, identity: &IdentityHash) -> StoreResult<Option<Identity>> {
        let identities = self.identities.read().map_err(poisoned)?;
        Ok(identities.get(identity).cloned())
    }

    fn store(&self, identity: &Identity) -> StoreResult<()> {
        let mut identities = self.identities.write().map_err(poisoned)?;
        identities.insert(identity.identity_hash.clone(), identity.clone());
        Ok(())
    }

    fn remove(&self, identity: &IdentityHash) -> StoreResult<bool> {
        let mut identities = self.identities.write().map_err(poisoned)?;
        Ok(identities.remove(identity).is_some())
    }
}

/// In-memory [`PrincipalIndex`].
#[derive(Debug, Default)]
pub struct InMemoryPrincipalIndex {
    bindings: RwLock<HashMap<String, IdentityHash>>,
}

impl InMemoryPrincipalIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrincipalIndex for InMemoryPrincipalIndex {
    fn lookup(&self, principal_id: &str) -> StoreResult<Option<IdentityHash>> {
        let bindings = self.bindings.read().map_err(poisoned)?;
        Ok(bindings.get(principal_id).cloned())
    }

    fn bind(&self, principal_id: &str, identity: &IdentityHash) -> StoreResult<()> {
        let mut bindings = self.bindings.write().map_err(poisoned)?;
        match bindings.get(principal_id) {
            Some(existing) if existing != identity => Err(StoreError::AlreadyBound {
                principal: principal_id.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                bindings.insert(principal_id.to_string(), identity.clone());
                Ok(())
            }
        }
    }
}
