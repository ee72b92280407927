//! Telegram WebApp authentication.
//!
//! Leaf-first: [`payload`] decodes initData, [`verifier`] checks its HMAC,
//! [`trust`] applies the environment policy, [`gate`] resolves the user and
//! [`middleware`] wires the gate into axum.

mod gate;
mod middleware;
mod payload;
mod trust;
mod verifier;

pub use gate::{AuthGate, AuthenticatedUser, CredentialSource, GateError};
pub use middleware::{optional_auth, require_auth, CurrentUser, MaybeUser, CREDENTIAL_HEADERS};
pub use payload::{parse_credential, AuthPayload, EmbeddedProfile, ParsedCredential};
pub use trust::{decide, RejectReason, TrustDecision, TrustTag, DEV_SENTINEL_EXTERNAL_ID};
pub use verifier::{check_string, compute_signature, verify, verify_signature, VerificationResult};

/// Why a credential could not be parsed or verified.
///
/// None of these carry signature material; they are safe to log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    // ---
    #[error("malformed credential: {0}")]
    MalformedPayload(String),

    #[error("credential has no hash field")]
    MissingSignature,

    #[error("no bot token configured")]
    NoSharedSecretConfigured,

    #[error("credential signature mismatch")]
    SignatureMismatch,

    #[error("credential auth_date is too old")]
    Expired,

    #[error("credential carries no user id")]
    MissingUserId,
}
