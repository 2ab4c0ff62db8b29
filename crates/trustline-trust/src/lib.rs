//! Trust scoring and verification service for Trustline.
//!
//! [`TrustService`] is the narrow interface collaborators call into: create
//! an identity, attach verification evidence, verify an identity at login,
//! and read the public trust projection. It owns no storage; stores are
//! injected at construction.

pub mod config;
pub mod error;
pub mod locks;
pub mod policy;
pub mod service;

pub use config::TrustConfig;
pub use error::{TrustError, TrustResult};
pub use locks::KeyedLocks;
pub use policy::{trust_delta, DEFAULT_DELTA};
pub use service::{TrustService, VerificationOutcome};

pub use trustline_crypto::{BreakReason, ChainReport, SignatureScheme};
pub use trustline_ledger::{
    Identity, IdentityVault, JsonFileStore, LedgerStats, PrincipalIndex, PublicLedgerEntry,
    PublicLedgerStore, SearchCriteria, TrustSummary,
};
pub use trustline_types::{IdentityHash, PrincipalData, TrustScore, VerificationKind};
