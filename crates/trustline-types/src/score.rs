use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Bounded trust score.
///
/// Always within `[0, 100]`. The only way to move a score is
/// [`TrustScore::raise`], which saturates at [`TrustScore::MAX`], so trust is
/// monotonic non-decreasing for the life of an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TrustScore(u8);

impl TrustScore {
    /// Score assigned to every freshly minted identity.
    pub const INITIAL: Self = Self(50);
    /// Ceiling.
    pub const MAX: Self = Self(100);

    /// Build a score, rejecting values above 100.
    pub fn new(value: u8) -> Result<Self, TypeError> {
        if value > Self::MAX.0 {
            return Err(TypeError::ScoreOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// `min(100, self + delta)`.
    pub fn raise(self, delta: u8) -> Self {
        Self(self.0.saturating_add(delta).min(Self::MAX.0))
    }

    pub fn is_max(&self) -> bool {
        self.0 == Self::MAX.0
    }
}

impl Default for TrustScore {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl TryFrom<u8> for TrustScore {
    type Error = TypeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TrustScore> for u8 {
    fn from(score: TrustScore) -> Self {
        score.0
    }
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
