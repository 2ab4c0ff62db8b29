use thiserror::Error;
use trustline_crypto::BreakReason;
use trustline_ledger::{LedgerError, StoreError};

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("identity not found: {0}")]
    NotFound(String),

    #[error("principal already has an identity: {principal}")]
    DuplicateIdentity { principal: String },

    #[error("chain compromised at record {index}: {reason}")]
    ChainCompromised { index: usize, reason: BreakReason },

    #[error("trust score {score} is below threshold {threshold}")]
    BelowThreshold { score: u8, threshold: u8 },

    #[error("invalid verification type: {0}")]
    InvalidVerificationType(String),

    #[error("invalid principal: {0}")]
    InvalidPrincipal(#[from] trustline_types::TypeError),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl TrustError {
    /// `verified: false` outcomes, as opposed to operational failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::ChainCompromised { .. } | Self::BelowThreshold { .. }
        )
    }
}

pub type TrustResult<T> = Result<T, TrustError>;
