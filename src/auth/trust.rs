//! Accept/fallback/reject policy for one credential.
//!
//! Evaluated once per request; holds no state. Rules, first match wins:
//!
//! 1. development mode and the credential is the dev sentinel: accept
//!    unverified as [`DEV_SENTINEL_EXTERNAL_ID`] without any signature check
//! 2. no credential: reject
//! 3. no bot token: accept unverified if the payload names a user, else reject
//! 4. signature valid: accept verified
//! 5. signature invalid in development mode: unverified fallback as in 3
//! 6. otherwise reject

use super::payload::{parse_credential, EmbeddedProfile};
use super::verifier::{verify, VerificationResult};
use super::AuthError;
use crate::config::AuthConfig;
use serde::Serialize;

/// External id attached to the development bypass identity.
pub const DEV_SENTINEL_EXTERNAL_ID: i64 = 1;

/// Whether the signature was actually checked for an accepted credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustTag {
    Verified,
    Unverified,
}

impl TrustTag {
    pub fn as_str(self) -> &'static str {
        // ---
        match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
        }
    }
}

impl std::fmt::Display for TrustTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable rejection reasons returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoCredential,
    SecretNotConfigured,
    HashVerificationFailed,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        // ---
        match self {
            Self::NoCredential => "No credential provided",
            Self::SecretNotConfigured => "shared secret not configured",
            Self::HashVerificationFailed => "hash verification failed",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustDecision {
    Accept {
        profile: EmbeddedProfile,
        trust: TrustTag,
    },
    Reject {
        reason: RejectReason,
    },
}

impl TrustDecision {
    fn reject(reason: RejectReason) -> Self {
        // ---
        Self::Reject { reason }
    }

    fn unverified(profile: EmbeddedProfile) -> Self {
        // ---
        Self::Accept {
            profile,
            trust: TrustTag::Unverified,
        }
    }

    pub fn is_accepted(&self) -> bool {
        // ---
        matches!(self, Self::Accept { .. })
    }
}

fn dev_sentinel_profile() -> EmbeddedProfile {
    // ---
    EmbeddedProfile {
        id: DEV_SENTINEL_EXTERNAL_ID,
        first_name: Some("Dev".to_string()),
        last_name: Some("User".to_string()),
        username: Some("dev_user".to_string()),
        photo_url: None,
    }
}

/// Profile extraction without any signature check.
fn unverified_profile(credential: &str) -> Option<EmbeddedProfile> {
    // ---
    parse_credential(credential).ok()?.payload.profile()
}

/// Decides what to do with `credential` under `config`.
///
/// `now_unix` is only consulted when a maximum credential age is configured.
pub fn decide(config: &AuthConfig, credential: Option<&str>, now_unix: i64) -> TrustDecision {
    // ---
    let credential = credential.map(str::trim).filter(|c| !c.is_empty());
    let development = config.environment.is_development();

    // Rule 1
    if development && credential == Some(config.dev_sentinel.as_str()) {
        tracing::debug!("Development sentinel credential accepted");
        return TrustDecision::unverified(dev_sentinel_profile());
    }

    // Rule 2
    let Some(credential) = credential else {
        return TrustDecision::reject(RejectReason::NoCredential);
    };

    // Rule 3
    if !config.has_bot_token() {
        return match unverified_profile(credential) {
            Some(profile) => {
                if !development {
                    tracing::warn!(
                        external_id = profile.id,
                        "Accepting unverified credential in production: TELEGRAM_BOT_TOKEN is not set"
                    );
                }
                TrustDecision::unverified(profile)
            }
            None => TrustDecision::reject(RejectReason::SecretNotConfigured),
        };
    }

    // Rule 4
    let failure = match parse_credential(credential) {
        Ok(parsed) => match verify(config.bot_token.as_deref(), &parsed, config.max_age, now_unix) {
            Ok(VerificationResult::Valid { profile, .. }) => {
                return TrustDecision::Accept {
                    profile,
                    trust: TrustTag::Verified,
                };
            }
            Ok(VerificationResult::Invalid { reason }) => reason,
            Err(err) => err,
        },
        Err(err) => err,
    };

    tracing::debug!("Credential verification failed: {failure}");

    // Rule 5
    if development || !config.has_bot_token() {
        if let Some(profile) = unverified_profile(credential) {
            tracing::warn!(
                external_id = profile.id,
                "Falling back to unverified credential: {failure}"
            );
            return TrustDecision::unverified(profile);
        }
    }

    // Rule 6
    if matches!(failure, AuthError::MalformedPayload(_)) {
        tracing::info!("Rejecting malformed credential: {failure}");
    }
    TrustDecision::reject(RejectReason::HashVerificationFailed)
}
