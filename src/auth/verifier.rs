//! HMAC-SHA256 verification of initData.
//!
//! ```text
//! check_string = sorted "key=value" lines joined by '\n' (hash excluded)
//! secret_key   = SHA256(bot_token)
//! signature    = hex(HMAC_SHA256(secret_key, check_string))
//! ```

use super::payload::{AuthPayload, EmbeddedProfile, ParsedCredential};
use super::AuthError;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::time::Duration;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Outcome of checking one credential against the configured bot token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    // ---
    Valid {
        external_id: i64,
        profile: EmbeddedProfile,
    },
    Invalid {
        reason: AuthError,
    },
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        // ---
        matches!(self, Self::Valid { .. })
    }
}

/// Builds the data-check string: one `key=value` per line in ascending
/// ordinal key order, values exactly as decoded.
pub fn check_string(payload: &AuthPayload) -> String {
    // ---
    payload
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn hmac_digest(bot_token: &str, check_string: &str) -> [u8; 32] {
    // ---
    let secret_key = Sha256::digest(bot_token.as_bytes());
    let mut mac =
        HmacSha256::new_from_slice(&secret_key).expect("HMAC accepts keys of any length");
    mac.update(check_string.as_bytes());

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}

/// Lowercase hex signature of `payload` under `bot_token`.
pub fn compute_signature(bot_token: &str, payload: &AuthPayload) -> String {
    // ---
    hex::encode(hmac_digest(bot_token, &check_string(payload)))
}

/// Checks `signature` against `payload` in constant time.
///
/// Hex case is ignored. A signature that is not 64 hex digits is a mismatch.
///
/// # Errors
/// [`AuthError::NoSharedSecretConfigured`] when `bot_token` is `None`;
/// [`AuthError::SignatureMismatch`] when the signature does not match.
pub fn verify_signature(
    bot_token: Option<&str>,
    payload: &AuthPayload,
    signature: &str,
) -> Result<(), AuthError> {
    // ---
    let bot_token = bot_token.ok_or(AuthError::NoSharedSecretConfigured)?;
    let supplied = hex::decode(signature.trim()).map_err(|_| AuthError::SignatureMismatch)?;
    let expected = hmac_digest(bot_token, &check_string(payload));

    if supplied.len() == expected.len() && bool::from(supplied.ct_eq(&expected)) {
        Ok(())
    } else {
        Err(AuthError::SignatureMismatch)
    }
}

/// Fully verifies a parsed credential.
///
/// `now_unix` and `max_age` drive the optional freshness check on
/// `auth_date`; pass `max_age = None` to skip it.
///
/// # Errors
/// Only [`AuthError::NoSharedSecretConfigured`]; every credential problem
/// is reported as [`VerificationResult::Invalid`].
pub fn verify(
    bot_token: Option<&str>,
    credential: &ParsedCredential,
    max_age: Option<Duration>,
    now_unix: i64,
) -> Result<VerificationResult, AuthError> {
    // ---
    if bot_token.is_none() {
        return Err(AuthError::NoSharedSecretConfigured);
    }

    let signature = match credential.signature() {
        Ok(signature) => signature,
        Err(reason) => return Ok(VerificationResult::Invalid { reason }),
    };

    if let Err(reason) = verify_signature(bot_token, &credential.payload, signature) {
        return Ok(VerificationResult::Invalid { reason });
    }

    if let Some(max_age) = max_age {
        let limit = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        let fresh = credential
            .payload
            .auth_date()
            .is_some_and(|issued| now_unix.saturating_sub(issued) <= limit);
        if !fresh {
            return Ok(VerificationResult::Invalid {
                reason: AuthError::Expired,
            });
        }
    }

    Ok(match credential.payload.profile() {
        Some(profile) => VerificationResult::Valid {
            external_id: profile.id,
            profile,
        },
        None => VerificationResult::Invalid {
            reason: AuthError::MissingUserId,
        },
    })
}
