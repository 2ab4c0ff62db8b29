//! Foundation types for Trustline.
//!
//! Every other Trustline crate depends on `trustline-types`. The types here
//! are plain values: they carry no storage or signing behaviour.
//!
//! # Key Types
//!
//! - [`Digest`]: 256-bit BLAKE3 digest, hex encoded on the wire
//! - [`IdentityHash`]: opaque, immutable identifier of a registered principal
//! - [`RecordId`] / [`RecordKind`]: identity and type of a ledger record
//! - [`VerificationKind`]: evidentiary event categories
//! - [`TrustScore`]: bounded reputation metric in `[0, 100]`
//! - [`PrincipalData`]: registration input supplied by collaborators

pub mod digest;
pub mod error;
pub mod identity;
pub mod record;
pub mod score;
pub mod verification;

pub use digest::Digest;
pub use error::TypeError;
pub use identity::{IdentityHash, PrincipalData};
pub use record::{RecordId, RecordKind};
pub use score::TrustScore;
pub use verification::{UnknownKind, VerificationKind};
