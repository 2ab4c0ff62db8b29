use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("trust score {0} is outside [0, 100]")]
    ScoreOutOfRange(u8),

    #[error("principal id must not be empty")]
    EmptyPrincipal,

    #[error("unknown record kind: {0}")]
    UnknownRecordKind(String),
}
