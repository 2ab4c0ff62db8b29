use serde::{Deserialize, Serialize};
use trustline_types::Digest;

use crate::hasher::HasherError;

/// A link in a hash chain: its own hash and the hash it points back to.
pub trait ChainLink {
    /// The link's stored hash.
    fn link_hash(&self) -> Digest;
    /// The stored hash of the predecessor ([`Digest::GENESIS`] for the first link).
    fn previous_hash(&self) -> Digest;
}

/// A link whose content is available, so its hash can be recomputed.
pub trait HashedLink: ChainLink {
    /// Recompute the hash over the link's content (excluding hash and signature).
    fn recompute_hash(&self) -> Result<Digest, HasherError>;
}

/// Hash chain integrity verifier.
///
/// Walks the stored order of a chain. Order is authoritative: timestamps are
/// never consulted, only hash linkage and content hashes.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify linkage and content hashes.
    ///
    /// Checks, stopping at the first failure:
    /// 1. The first link points at the genesis sentinel
    /// 2. Each subsequent link's previous hash equals its predecessor's hash
    /// 3. Each link's stored hash equals the hash recomputed from its content
    pub fn verify_chain<L: HashedLink>(links: &[L]) -> Result<(), ChainError> {
        for (index, link) in links.iter().enumerate() {
            Self::check_link(links, index)?;
            let computed = link
                .recompute_hash()
                .map_err(|e| ChainError::Unhashable {
                    index,
                    reason: e.to_string(),
                })?;
            if computed != link.link_hash() {
                return Err(ChainError::HashMismatch { index });
            }
        }
        Ok(())
    }

    /// Verify linkage only, for redacted chains whose content is not available.
    pub fn verify_links<L: ChainLink>(links: &[L]) -> Result<(), ChainError> {
        for index in 0..links.len() {
            Self::check_link(links, index)?;
        }
        Ok(())
    }

    /// Run [`HashChainVerifier::verify_chain`] and fold the outcome into a report.
    pub fn report<L: HashedLink>(links: &[L]) -> ChainReport {
        ChainReport::from_result(links.len(), Self::verify_chain(links))
    }

    /// Run [`HashChainVerifier::verify_links`] and fold the outcome into a report.
    pub fn report_links<L: ChainLink>(links: &[L]) -> ChainReport {
        ChainReport::from_result(links.len(), Self::verify_links(links))
    }

    fn check_link<L: ChainLink>(links: &[L], index: usize) -> Result<(), ChainError> {
        let link = &links[index];
        if index == 0 {
            let found = link.previous_hash();
            if !found.is_genesis() {
                return Err(ChainError::GenesisLink { found });
            }
            return Ok(());
        }
        if link.previous_hash() != links[index - 1].link_hash() {
            return Err(ChainError::BrokenLink { index });
        }
        Ok(())
    }
}

/// Errors from chain verification.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("genesis record points at {found:?} instead of the genesis sentinel")]
    GenesisLink { found: Digest },

    #[error("broken link at index {index}: previous hash does not match")]
    BrokenLink { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },

    #[error("signature mismatch at index {index}")]
    SignatureMismatch { index: usize },

    #[error("record at index {index} cannot be hashed: {reason}")]
    Unhashable { index: usize, reason: String },
}

impl ChainError {
    /// Index of the first offending record.
    pub fn index(&self) -> usize {
        match self {
            Self::GenesisLink { .. } => 0,
            Self::BrokenLink { index }
            | Self::HashMismatch { index }
            | Self::SignatureMismatch { index }
            | Self::Unhashable { index, .. } => *index,
        }
    }

    pub fn reason(&self) -> BreakReason {
        match self {
            Self::GenesisLink { .. } => BreakReason::GenesisLink,
            Self::BrokenLink { .. } => BreakReason::BrokenLink,
            Self::HashMismatch { .. } => BreakReason::HashMismatch,
            Self::SignatureMismatch { .. } => BreakReason::SignatureMismatch,
            Self::Unhashable { .. } => BreakReason::Unhashable,
        }
    }
}

/// Why a chain was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakReason {
    GenesisLink,
    BrokenLink,
    HashMismatch,
    SignatureMismatch,
    Unhashable,
}

impl std::fmt::Display for BreakReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::GenesisLink => "genesis link",
            Self::BrokenLink => "hash linkage broken",
            Self::HashMismatch => "hash integrity compromised",
            Self::SignatureMismatch => "signature mismatch",
            Self::Unhashable => "unhashable content",
        };
        f.write_str(s)
    }
}

/// Outcome of a chain walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub valid: bool,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broken_at: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BreakReason>,
}

impl ChainReport {
    pub fn from_result(length: usize, result: Result<(), ChainError>) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                length,
                broken_at: None,
                reason: None,
            },
            Err(e) => Self {
                valid: false,
                length,
                broken_at: Some(e.index()),
                reason: Some(e.reason()),
            },
        }
    }
}
