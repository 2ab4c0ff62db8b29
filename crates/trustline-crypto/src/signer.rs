use std::fmt;

use serde::{Deserialize, Serialize};
use trustline_types::{Digest, IdentityHash};

use crate::hasher::{random_salt, ContentHasher};

const SIMULATED_PUBLIC_PREFIX: &str = "pub_";
const SIMULATED_PRIVATE_PREFIX: &str = "prv_";
const ED25519_PUBLIC_PREFIX: &str = "ed25519_pub_";
const ED25519_PRIVATE_PREFIX: &str = "ed25519_prv_";

/// How ledger records are bound to an identity's private key material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureScheme {
    /// `signature = digest(hash || private_key)`. Only the key owner can
    /// check it; it is tamper evidence, not a real signature.
    #[default]
    Simulated,
    /// Ed25519 over the record hash, verifiable with the public key alone.
    Ed25519,
}

impl SignatureScheme {
    /// Human-readable algorithm label recorded in identity metadata.
    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Simulated => "BLAKE3",
            Self::Ed25519 => "BLAKE3+Ed25519",
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulated => f.write_str("simulated"),
            Self::Ed25519 => f.write_str("ed25519"),
        }
    }
}

/// Private key material. Never printed, never part of a public projection.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key string. Callers must keep it inside the owning context.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(<redacted>)")
    }
}

/// A public/private key pair bound to one identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPair {
    scheme: SignatureScheme,
    public_key: String,
    private_key: PrivateKey,
}

impl KeyPair {
    /// Derive a fresh key pair for an identity, salted with random bytes.
    pub fn derive(scheme: SignatureScheme, identity: &IdentityHash) -> Self {
        Self::derive_with_salt(scheme, identity, &random_salt())
    }

    /// Deterministic derivation from an identity and an explicit salt.
    pub fn derive_with_salt(scheme: SignatureScheme, identity: &IdentityHash, salt: &[u8]) -> Self {
        let identity_hex = identity.to_hex();
        match scheme {
            SignatureScheme::Simulated => {
                let public = ContentHasher::KEY
                    .hash_parts(&[identity_hex.as_bytes(), b"_public".as_slice()])
                    .to_hex();
                let private = ContentHasher::KEY
                    .hash_parts(&[identity_hex.as_bytes(), b"_private_".as_slice(), salt])
                    .to_hex();
                Self {
                    scheme,
                    public_key: format!("{SIMULATED_PUBLIC_PREFIX}{}", &public[..32]),
                    private_key: PrivateKey(format!(
                        "{SIMULATED_PRIVATE_PREFIX}{}",
                        &private[..32]
                    )),
                }
            }
            SignatureScheme::Ed25519 => {
                let seed = *ContentHasher::KEY
                    .hash_parts(&[
                        b"ed25519:".as_slice(),
                        identity.digest().as_bytes().as_slice(),
                        salt,
                    ])
                    .as_bytes();
                let signing = ed25519_dalek::SigningKey::from_bytes(&seed);
                Self {
                    scheme,
                    public_key: format!(
                        "{ED25519_PUBLIC_PREFIX}{}",
                        hex::encode(signing.verifying_key().to_bytes())
                    ),
                    private_key: PrivateKey(format!(
                        "{ED25519_PRIVATE_PREFIX}{}",
                        hex::encode(seed)
                    )),
                }
            }
        }
    }

    /// Reassemble a key pair from stored parts.
    pub fn from_parts(
        scheme: SignatureScheme,
        public_key: impl Into<String>,
        private_key: PrivateKey,
    ) -> Result<Self, KeyError> {
        let pair = Self {
            scheme,
            public_key: public_key.into(),
            private_key,
        };
        let (public_prefix, private_prefix) = match scheme {
            SignatureScheme::Simulated => (SIMULATED_PUBLIC_PREFIX, SIMULATED_PRIVATE_PREFIX),
            SignatureScheme::Ed25519 => (ED25519_PUBLIC_PREFIX, ED25519_PRIVATE_PREFIX),
        };
        if !pair.public_key.starts_with(public_prefix) {
            return Err(KeyError::InvalidKey(format!(
                "public key does not match scheme {scheme}"
            )));
        }
        if !pair.private_key.0.starts_with(private_prefix) {
            return Err(KeyError::InvalidKey(format!(
                "private key does not match scheme {scheme}"
            )));
        }
        if scheme == SignatureScheme::Ed25519 {
            let signing = pair.ed25519_signing_key()?;
            if Self::ed25519_verifying_key(&pair.public_key)? != signing.verifying_key() {
                return Err(KeyError::InvalidKey("public key does not match private key".into()));
            }
        }
        Ok(pair)
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Bind a record hash to this key pair.
    pub fn sign(&self, hash: &Digest) -> Result<String, KeyError> {
        match self.scheme {
            SignatureScheme::Simulated => Ok(self.simulated_signature(hash)),
            SignatureScheme::Ed25519 => {
                use ed25519_dalek::Signer;
                let signing = self.ed25519_signing_key()?;
                Ok(hex::encode(signing.sign(hash.as_bytes()).to_bytes()))
            }
        }
    }

    /// Check a signature produced by [`KeyPair::sign`].
    pub fn verify(&self, hash: &Digest, signature: &str) -> Result<(), KeyError> {
        match self.scheme {
            SignatureScheme::Simulated => {
                if self.simulated_signature(hash) == signature {
                    Ok(())
                } else {
                    Err(KeyError::InvalidSignature)
                }
            }
            SignatureScheme::Ed25519 => {
                Self::verify_public(self.scheme, &self.public_key, hash, signature)
            }
        }
    }

    /// Check a signature with the public key only.
    ///
    /// Simulated signatures cannot be checked without the private key.
    pub fn verify_public(
        scheme: SignatureScheme,
        public_key: &str,
        hash: &Digest,
        signature: &str,
    ) -> Result<(), KeyError> {
        match scheme {
            SignatureScheme::Simulated => Err(KeyError::PublicVerificationUnsupported),
            SignatureScheme::Ed25519 => {
                use ed25519_dalek::Verifier;
                let verifying = Self::ed25519_verifying_key(public_key)?;
                let bytes = hex::decode(signature).map_err(|_| KeyError::InvalidSignature)?;
                let arr: [u8; 64] = bytes.try_into().map_err(|_| KeyError::InvalidSignature)?;
                let sig = ed25519_dalek::Signature::from_bytes(&arr);
                verifying
                    .verify(hash.as_bytes(), &sig)
                    .map_err(|_| KeyError::InvalidSignature)
            }
        }
    }

    fn simulated_signature(&self, hash: &Digest) -> String {
        ContentHasher::SIGNATURE
            .hash_parts(&[hash.to_hex().as_bytes(), self.private_key.0.as_bytes()])
            .to_hex()
    }

    fn ed25519_signing_key(&self) -> Result<ed25519_dalek::SigningKey, KeyError> {
        let hex_seed = self
            .private_key
            .0
            .strip_prefix(ED25519_PRIVATE_PREFIX)
            .ok_or_else(|| KeyError::InvalidKey("missing ed25519 private prefix".into()))?;
        let seed: [u8; 32] = decode_32(hex_seed)?;
        Ok(ed25519_dalek::SigningKey::from_bytes(&seed))
    }

    fn ed25519_verifying_key(public_key: &str) -> Result<ed25519_dalek::VerifyingKey, KeyError> {
        let hex_key = public_key
            .strip_prefix(ED25519_PUBLIC_PREFIX)
            .ok_or_else(|| KeyError::InvalidKey("missing ed25519 public prefix".into()))?;
        let bytes = decode_32(hex_key)?;
        ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))
    }
}

fn decode_32(s: &str) -> Result<[u8; 32], KeyError> {
    let bytes = hex::decode(s).map_err(|e| KeyError::InvalidKey(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| KeyError::InvalidKey("expected 32 key bytes".into()))
}

/// Errors from key handling and signature checks.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("signature scheme cannot be verified with the public key alone")]
    PublicVerificationUnsupported,
}
