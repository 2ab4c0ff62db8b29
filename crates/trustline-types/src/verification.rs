use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of an evidentiary event.
///
/// The well-known kinds map to fixed trust deltas in the trust service.
/// Anything else parses to [`VerificationKind::Other`], which keeps the raw
/// name so it round-trips through storage unchanged. The payload can only be
/// built by parsing, so a known wire name always lands on its own variant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VerificationKind {
    EmailVerified,
    PhoneVerified,
    IdentityDocument,
    Biometric,
    GovernmentId,
    AddressVerified,
    EmploymentVerified,
    FinancialVerified,
    SocialVerified,
    Other(UnknownKind),
}

/// Name of a verification kind outside the known set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnknownKind(String);

impl UnknownKind {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl VerificationKind {
    /// All kinds with a dedicated trust delta.
    pub const KNOWN: [VerificationKind; 9] = [
        Self::EmailVerified,
        Self::PhoneVerified,
        Self::IdentityDocument,
        Self::Biometric,
        Self::GovernmentId,
        Self::AddressVerified,
        Self::EmploymentVerified,
        Self::FinancialVerified,
        Self::SocialVerified,
    ];

    /// Wire name, e.g. `GOVERNMENT_ID`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::EmailVerified => "EMAIL_VERIFIED",
            Self::PhoneVerified => "PHONE_VERIFIED",
            Self::IdentityDocument => "IDENTITY_DOCUMENT",
            Self::Biometric => "BIOMETRIC",
            Self::GovernmentId => "GOVERNMENT_ID",
            Self::AddressVerified => "ADDRESS_VERIFIED",
            Self::EmploymentVerified => "EMPLOYMENT_VERIFIED",
            Self::FinancialVerified => "FINANCIAL_VERIFIED",
            Self::SocialVerified => "SOCIAL_VERIFIED",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Returns `false` for [`VerificationKind::Other`].
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for VerificationKind {
    fn from(s: &str) -> Self {
        match s {
            "EMAIL_VERIFIED" => Self::EmailVerified,
            "PHONE_VERIFIED" => Self::PhoneVerified,
            "IDENTITY_DOCUMENT" => Self::IdentityDocument,
            "BIOMETRIC" => Self::Biometric,
            "GOVERNMENT_ID" => Self::GovernmentId,
            "ADDRESS_VERIFIED" => Self::AddressVerified,
            "EMPLOYMENT_VERIFIED" => Self::EmploymentVerified,
            "FINANCIAL_VERIFIED" => Self::FinancialVerified,
            "SOCIAL_VERIFIED" => Self::SocialVerified,
            other => Self::Other(UnknownKind(other.to_string())),
        }
    }
}

impl From<String> for VerificationKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<VerificationKind> for String {
    fn from(kind: VerificationKind) -> Self {
        match kind {
            VerificationKind::Other(name) => name.0,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for VerificationKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_kinds_parse_from_wire_names() {
        for kind in VerificationKind::KNOWN {
            let parsed: VerificationKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
            assert!(parsed.is_known());
        }
    }

    #[test]
    fn unknown_kind_keeps_its_name() {
        let kind = VerificationKind::from("PASSPORT_SCAN");
        assert!(matches!(kind, VerificationKind::Other(ref n) if n.as_str() == "PASSPORT_SCAN"));
        assert!(!kind.is_known());
        assert_eq!(kind.to_string(), "PASSPORT_SCAN");
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&VerificationKind::GovernmentId).unwrap();
        assert_eq!(json, "\"GOVERNMENT_ID\"");
        let other: VerificationKind = serde_json::from_str("\"NOTARY\"").unwrap();
        assert_eq!(other, VerificationKind::from("NOTARY"));
        assert!(!other.is_known());
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"NOTARY\"");
    }

    #[test]
    fn known_names_never_become_other() {
        for kind in VerificationKind::KNOWN {
            let from_owned = VerificationKind::from(kind.as_str().to_string());
            assert_eq!(from_owned, kind);
            let reloaded: VerificationKind =
                serde_json::from_str(&serde_json::to_string(&from_owned).unwrap()).unwrap();
            assert_eq!(reloaded, kind);
        }
    }
}
