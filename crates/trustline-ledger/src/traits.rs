use trustline_types::IdentityHash;

use crate::error::StoreResult;
use crate::identity::Identity;
use crate::projection::PublicLedgerEntry;

/// Shared, network-readable store of redacted identity entries.
pub trait PublicLedgerStore: Send + Sync {
    fn get(&self, identity: &IdentityHash) -> StoreResult<Option<PublicLedgerEntry>>;

    /// Insert or replace the entry keyed by its identity hash.
    fn put(&self, entry: &PublicLedgerEntry) -> StoreResult<()>;

    /// All entries, in no particular order.
    fn entries(&self) -> StoreResult<Vec<PublicLedgerEntry>>;

    fn contains(&self, identity: &IdentityHash) -> StoreResult<bool> {
        Ok(self.get(identity)?.is_some())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.entries()?.len())
    }
}

/// Owner-only store of full identities, private keys included.
pub trait IdentityVault: Send + Sync {
    fn load(&self, identity: &IdentityHash) -> StoreResult<Option<Identity>>;

    /// Insert or replace the identity keyed by its identity hash.
    fn store(&self, identity: &Identity) -> StoreResult<()>;

    /// Drop the identity. Returns `false` if it was not held.
    fn remove(&self, identity: &IdentityHash) -> StoreResult<bool>;
}

/// Maps principal ids to the identity they registered.
pub trait PrincipalIndex: Send + Sync {
    fn lookup(&self, principal_id: &str) -> StoreResult<Option<IdentityHash>>;

    /// Bind a principal to an identity.
    ///
    /// Fails with [`StoreError::AlreadyBound`](crate::StoreError::AlreadyBound)
    /// if the principal is bound to a different identity. Rebinding to the same
    /// identity is a no-op.
    fn bind(&self, principal_id: &str, identity: &IdentityHash) -> StoreResult<()>;
}
