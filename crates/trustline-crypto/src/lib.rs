//! Cryptographic primitives for Trustline.
//!
//! Provides domain-separated BLAKE3 hashing, hash chain verification, and
//! the key material used to sign ledger records (simulated digest signing or
//! Ed25519).
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod chain;
pub mod hasher;
pub mod signer;

pub use chain::{BreakReason, ChainError, ChainLink, ChainReport, HashChainVerifier, HashedLink};
pub use hasher::{random_salt, ContentHasher, HasherError};
pub use signer::{KeyError, KeyPair, PrivateKey, SignatureScheme};
