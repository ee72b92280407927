//! Telegram initData parsing.
//!
//! initData is a URL query string such as
//! `query_id=AAH..&user=%7B%22id%22%3A42..%7D&auth_date=1700000000&hash=..`.
//! Parsing only decodes it; nothing here checks the signature.

use super::AuthError;
use crate::domain::ProfileFields;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Field carrying the hex HMAC signature. Never part of the check string.
pub const SIGNATURE_FIELD: &str = "hash";

/// Field carrying the JSON-encoded user profile.
pub const PROFILE_FIELD: &str = "user";

/// Decoded credential fields, excluding the signature.
///
/// Backed by a `BTreeMap<String, _>`, so iteration is in ascending byte-wise
/// key order, which is exactly the order the check string needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthPayload {
    fields: BTreeMap<String, String>,
}

impl AuthPayload {
    // ---
    pub fn get(&self, key: &str) -> Option<&str> {
        // ---
        self.fields.get(key).map(String::as_str)
    }

    /// Fields in ascending ordinal key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        // ---
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        // ---
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        // ---
        self.fields.is_empty()
    }

    /// `auth_date` as Unix seconds, when present and numeric.
    pub fn auth_date(&self) -> Option<i64> {
        // ---
        self.get("auth_date")?.parse().ok()
    }

    /// Extracts the user profile, if any.
    ///
    /// Mini App initData nests the profile as JSON under `user`. Login Widget
    /// payloads carry the same fields flat (`id`, `first_name`, ...); that
    /// layout is used only when no `user` field exists. A `user` value that
    /// is not valid profile JSON yields `None`.
    pub fn profile(&self) -> Option<EmbeddedProfile> {
        // ---
        match self.get(PROFILE_FIELD) {
            Some(json) => match serde_json::from_str::<EmbeddedProfile>(json) {
                Ok(profile) => Some(profile),
                Err(err) => {
                    tracing::debug!("initData user field is not a usable profile: {err}");
                    None
                }
            },
            None => self.flat_profile(),
        }
    }

    fn flat_profile(&self) -> Option<EmbeddedProfile> {
        // ---
        let id = self.get("id")?.trim().parse().ok()?;
        let owned = |key: &str| self.get(key).map(str::to_string);

        Some(EmbeddedProfile {
            id,
            first_name: owned("first_name"),
            last_name: owned("last_name"),
            username: owned("username"),
            photo_url: owned("photo_url"),
        })
    }
}

impl FromIterator<(String, String)> for AuthPayload {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        // ---
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Telegram user object as embedded in initData.
///
/// Unknown fields (`language_code`, `is_premium`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmbeddedProfile {
    // ---
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl EmbeddedProfile {
    // ---
    /// Projects the profile onto the directory's mutable user fields.
    pub fn fields(&self) -> ProfileFields {
        // ---
        ProfileFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            avatar_url: self.photo_url.clone(),
        }
    }
}

/// Result of parsing a raw credential: its fields plus the signature, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCredential {
    pub payload: AuthPayload,
    signature: Option<String>,
}

impl ParsedCredential {
    // ---
    /// The supplied `hash` value.
    ///
    /// # Errors
    /// [`AuthError::MissingSignature`] when the credential carried none.
    pub fn signature(&self) -> Result<&str, AuthError> {
        // ---
        self.signature.as_deref().ok_or(AuthError::MissingSignature)
    }
}

/// Decodes a raw initData string.
///
/// # Errors
/// [`AuthError::MalformedPayload`] when the input is blank, has a segment
/// without `=`, an empty or repeated key, or percent-escapes that do not
/// decode to UTF-8.
pub fn parse_credential(raw: &str) -> Result<ParsedCredential, AuthError> {
    // ---
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AuthError::MalformedPayload("empty credential".into()));
    }

    let mut fields = BTreeMap::new();
    let mut signature = None;

    for segment in raw.split('&').filter(|s| !s.is_empty()) {
        // ---
        if !segment.contains('=') {
            return Err(AuthError::MalformedPayload(format!(
                "segment without '=': {}",
                truncate(segment)
            )));
        }

        let (key, value) = decode_pair(segment)?;
        if key.is_empty() {
            return Err(AuthError::MalformedPayload("empty field name".into()));
        }

        if key == SIGNATURE_FIELD {
            if signature.replace(value).is_some() {
                return Err(AuthError::MalformedPayload("duplicate field: hash".into()));
            }
            continue;
        }

        if fields.contains_key(&key) {
            return Err(AuthError::MalformedPayload(format!("duplicate field: {key}")));
        }
        fields.insert(key, value);
    }

    if fields.is_empty() && signature.is_none() {
        return Err(AuthError::MalformedPayload("no fields".into()));
    }

    Ok(ParsedCredential {
        payload: AuthPayload { fields },
        signature,
    })
}

/// Decodes one `key=value` segment with form-urlencoded rules (`+` is a
/// space, `%XX` escapes).
fn decode_pair(segment: &str) -> Result<(String, String), AuthError> {
    // ---
    let (key, value) = url::form_urlencoded::parse(segment.as_bytes())
        .next()
        .ok_or_else(|| AuthError::MalformedPayload("undecodable segment".into()))?;

    // form_urlencoded decodes lossily; a replacement character that was not
    // in the raw text means the escapes were not valid UTF-8.
    let lossy = |decoded: &str| decoded.contains('\u{FFFD}') && !segment.contains('\u{FFFD}');
    if lossy(&key) || lossy(&value) {
        return Err(AuthError::MalformedPayload("invalid UTF-8 in escapes".into()));
    }

    Ok((key.into_owned(), value.into_owned()))
}

fn truncate(segment: &str) -> String {
    // ---
    segment.chars().take(32).collect()
}
