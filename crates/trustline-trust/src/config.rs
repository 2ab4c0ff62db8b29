use serde::{Deserialize, Serialize};
use trustline_crypto::SignatureScheme;

/// Configuration for [`TrustService`](crate::TrustService).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Network name folded into every identity hash and stamped into metadata.
    pub network_name: String,
    /// Version stamped into identity metadata.
    pub version: String,
    /// Minimum score for `verify_identity` to succeed.
    pub trust_threshold: u8,
    /// Reject verification kinds without a dedicated delta instead of
    /// granting the default bump.
    pub strict_verification_types: bool,
    /// Scheme used for newly created identities.
    pub signature_scheme: SignatureScheme,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            network_name: "Trustline Network".into(),
            version: "1.0.0".into(),
            trust_threshold: 50,
            strict_verification_types: false,
            signature_scheme: SignatureScheme::Simulated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = TrustConfig::default();
        assert_eq!(cfg.trust_threshold, 50);
        assert!(!cfg.strict_verification_types);
        assert_eq!(cfg.signature_scheme, SignatureScheme::Simulated);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"trust_threshold": 70, "signature_scheme": "ed25519"}"#;
        let cfg: TrustConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.trust_threshold, 70);
        assert_eq!(cfg.signature_scheme, SignatureScheme::Ed25519);
        assert_eq!(cfg.network_name, "Trustline Network");
    }
}
