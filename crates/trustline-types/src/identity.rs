use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::TypeError;

/// Opaque identifier of a registered principal.
///
/// Minted once by the trust service from the principal's data, a timestamp,
/// and a random salt. It never changes afterwards and is the key of both the
/// public ledger and the owner vault.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityHash(Digest);

impl IdentityHash {
    /// Wrap an already-computed digest.
    pub fn from_digest(digest: Digest) -> Self {
        Self(digest)
    }

    /// A random identity hash for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(Digest::from_bytes(&bytes))
    }

    /// The underlying digest.
    pub fn digest(&self) -> &Digest {
        &self.0
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Short identifier (`id:` + first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("id:{}", self.0.short_hex())
    }

    /// Parse from hex, accepting an optional `id:` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("id:").unwrap_or(s);
        Digest::from_hex(s).map(Self)
    }
}

impl fmt::Debug for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityHash({})", self.short_id())
    }
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IdentityHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Registration input supplied by the principal registration flow.
///
/// `principal_id` is the stable handle of the principal (typically an email
/// address). `attributes` are folded into the identity hash but are not
/// otherwise interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalData {
    pub principal_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl PrincipalData {
    /// Principal identified by an email address.
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            principal_id: email.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute (builder style).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Reject blank principal ids.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.principal_id.trim().is_empty() {
            return Err(TypeError::EmptyPrincipal);
        }
        Ok(())
    }
}
