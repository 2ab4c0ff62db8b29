//! Append-only, hash-chained identity ledger for Trustline.
//!
//! This crate is the ledger engine. It provides:
//! - [`Identity`], [`LedgerRecord`] and [`VerificationRecord`] with hash-linked integrity
//! - [`ChainWriter`] for appending signed records to an identity's chain
//! - The redacted public projection ([`PublicLedgerEntry`]) and [`LedgerStats`]
//! - Storage boundaries ([`PublicLedgerStore`], [`IdentityVault`], [`PrincipalIndex`])
//!   with in-memory and JSON-file implementations

pub mod error;
pub mod file;
pub mod identity;
pub mod memory;
pub mod projection;
pub mod records;
pub mod traits;
pub mod writer;

pub use error::{LedgerError, StoreError, StoreResult};
pub use file::JsonFileStore;
pub use identity::{Identity, IdentityMetadata};
pub use memory::{InMemoryPrincipalIndex, InMemoryPublicLedger, InMemoryVault};
pub use projection::{LedgerStats, PublicLedgerEntry, PublicRecord, SearchCriteria, TrustSummary};
pub use records::{LedgerRecord, VerificationRecord};
pub use traits::{IdentityVault, PrincipalIndex, PublicLedgerStore};
pub use writer::ChainWriter;
