//! Fixed trust-delta table.

use trustline_types::VerificationKind;

/// Delta granted to verification kinds without a dedicated entry.
pub const DEFAULT_DELTA: u8 = 5;

/// Score increase for one verification of `kind`.
///
/// Unknown kinds get [`DEFAULT_DELTA`]; strict mode in the service rejects
/// them before this is consulted.
pub fn trust_delta(kind: &VerificationKind) -> u8 {
    match kind {
        VerificationKind::EmailVerified => 10,
        VerificationKind::PhoneVerified => 10,
        VerificationKind::IdentityDocument => 20,
        VerificationKind::Biometric => 15,
        VerificationKind::GovernmentId => 25,
        VerificationKind::AddressVerified => 10,
        VerificationKind::EmploymentVerified => 15,
        VerificationKind::FinancialVerified => 15,
        VerificationKind::SocialVerified => 5,
        VerificationKind::Other(_) => DEFAULT_DELTA,
    }
}
