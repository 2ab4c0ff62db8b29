use trustline_crypto::{ChainError, HasherError, KeyError};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("chain integrity violation: {0}")]
    Chain(#[from] ChainError),

    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<HasherError> for LedgerError {
    fn from(e: HasherError) -> Self {
        match e {
            HasherError::Serialization(msg) => Self::Serialization(msg),
        }
    }
}

/// Errors from storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// The principal is already bound to an identity.
    #[error("principal already bound: {principal}")]
    AlreadyBound { principal: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
