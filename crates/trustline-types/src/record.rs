use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::TypeError;

/// Unique identifier of a ledger record.
///
/// Derived from the append timestamp and a random salt, so two records never
/// share an id even when their payloads are identical.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Digest);

impl RecordId {
    pub fn from_digest(digest: Digest) -> Self {
        Self(digest)
    }

    pub fn digest(&self) -> &Digest {
        &self.0
    }

    pub fn short_id(&self) -> String {
        format!("tx:{}", self.0.short_hex())
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.short_id())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a record in an identity's hash chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    /// Genesis record written when the identity is minted.
    IdentityCreated,
    /// A verification event raised the identity's trust score.
    VerificationAdded,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityCreated => "IDENTITY_CREATED",
            Self::VerificationAdded => "VERIFICATION_ADDED",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDENTITY_CREATED" => Ok(Self::IdentityCreated),
            "VERIFICATION_ADDED" => Ok(Self::VerificationAdded),
            other => Err(TypeError::UnknownRecordKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&RecordKind::IdentityCreated).unwrap(),
            "\"IDENTITY_CREATED\""
        );
        assert_eq!(
            serde_json::to_string(&RecordKind::VerificationAdded).unwrap(),
            "\"VERIFICATION_ADDED\""
        );
    }

    #[test]
    fn record_kind_parse_matches_display() {
        for kind in [RecordKind::IdentityCreated, RecordKind::VerificationAdded] {
            assert_eq!(kind.to_string().parse::<RecordKind>().unwrap(), kind);
        }
        assert!(matches!(
            "REVOKED".parse::<RecordKind>(),
            Err(TypeError::UnknownRecordKind(_))
        ));
    }

    #[test]
    fn record_id_short_form() {
        let id = RecordId::from_digest(Digest::from_hash([0xcd; 32]));
        assert_eq!(id.short_id(), "tx:cdcdcdcd");
    }
}
