//! axum wiring for the authentication gate.
//!
//! [`require_auth`] rejects unauthenticated requests with 401;
//! [`optional_auth`] lets them through without an identity. Handlers read
//! the result with the [`CurrentUser`] and [`MaybeUser`] extractors.

use super::gate::{AuthenticatedUser, CredentialSource, GateError};
use crate::app_state::AppState;
use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        request::Parts,
        HeaderMap, Uri,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Headers that may carry raw initData, in lookup order. Header names are
/// case-insensitive, so every historical capitalization matches.
pub const CREDENTIAL_HEADERS: [&str; 4] = [
    "x-telegram-init-data",
    "x-telegram-initdata",
    "telegram-init-data",
    "x-init-data",
];

/// Query or JSON body fields accepted from legacy clients.
const LEGACY_ID_FIELDS: [&str; 4] = ["user_id", "userId", "telegram_id", "telegramId"];

/// Largest JSON body buffered while looking for a legacy user id.
const LEGACY_BODY_LIMIT: usize = 64 * 1024;

fn header_credential(headers: &HeaderMap) -> Option<String> {
    // ---
    CREDENTIAL_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn query_legacy_id(uri: &Uri) -> Option<i64> {
    // ---
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| LEGACY_ID_FIELDS.contains(&key.as_ref()))
        .find_map(|(_, value)| value.trim().parse().ok())
}

fn body_legacy_id(body: &[u8]) -> Option<i64> {
    // ---
    let value: Value = serde_json::from_slice(body).ok()?;
    LEGACY_ID_FIELDS
        .iter()
        .find_map(|field| match value.get(*field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

fn is_json(headers: &HeaderMap) -> bool {
    // ---
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("application/json"))
}

/// Whether the declared body size allows buffering it. Bodies without a
/// `content-length` are streamed through untouched.
fn body_fits(headers: &HeaderMap) -> bool {
    // ---
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<usize>().ok())
        .is_some_and(|len| len <= LEGACY_BODY_LIMIT)
}

/// Picks the credential for `request`: a credential header first, then a
/// legacy id in the query string, then a legacy id in a JSON body.
///
/// Only JSON bodies that declare a length within [`LEGACY_BODY_LIMIT`] are
/// inspected; they are buffered and put back so handlers can still read
/// them. Never fails: anything unreadable counts as no credential.
async fn extract_credential(request: Request) -> (Request, CredentialSource) {
    // ---
    if let Some(raw) = header_credential(request.headers()) {
        return (request, CredentialSource::InitData(raw));
    }

    if let Some(external_id) = query_legacy_id(request.uri()) {
        return (request, CredentialSource::LegacyUserId(external_id));
    }

    if !is_json(request.headers()) || !body_fits(request.headers()) {
        return (request, CredentialSource::Missing);
    }

    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, LEGACY_BODY_LIMIT).await {
        Ok(bytes) => {
            let source = body_legacy_id(&bytes)
                .map(CredentialSource::LegacyUserId)
                .unwrap_or(CredentialSource::Missing);
            (Request::from_parts(parts, Body::from(bytes)), source)
        }
        Err(err) => {
            tracing::warn!("Could not buffer request body for authentication: {err}");
            (Request::from_parts(parts, Body::empty()), CredentialSource::Missing)
        }
    }
}

/// Middleware that rejects requests the gate does not accept.
///
/// Install with `axum::middleware::from_fn_with_state(state, require_auth)`.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    // ---
    let (mut request, source) = extract_credential(request).await;

    match state.gate().authenticate(source).await {
        Ok(auth) => {
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Middleware that resolves an identity when it can and otherwise proceeds
/// anonymously.
pub async fn optional_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    // ---
    let (mut request, source) = extract_credential(request).await;

    let auth = state.gate().authenticate_optional(source).await;
    if let Some(auth) = &auth {
        request.extensions_mut().insert(auth.clone());
    }
    request.extensions_mut().insert(MaybeUser(auth));

    next.run(request).await
}

/// The authenticated user for a route behind [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // ---
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| GateError::Unauthorized("No credential provided".to_string()))
    }
}

/// The user, if any, for a route behind [`optional_auth`].
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // ---
        let found = match parts.extensions.get::<MaybeUser>() {
            Some(maybe) => maybe.clone(),
            None => MaybeUser(parts.extensions.get::<AuthenticatedUser>().cloned()),
        };
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn credential_header_spellings_are_recognized() {
        // ---
        for name in CREDENTIAL_HEADERS {
            let mut headers = HeaderMap::new();
            headers.insert(name, HeaderValue::from_static("auth_date=1&id=2&hash=00"));
            assert_eq!(
                header_credential(&headers).as_deref(),
                Some("auth_date=1&id=2&hash=00"),
                "header {name}"
            );
        }
    }

    #[test]
    fn blank_header_is_ignored() {
        // ---
        let mut headers = HeaderMap::new();
        headers.insert("x-telegram-init-data", HeaderValue::from_static("  "));
        headers.insert("x-init-data", HeaderValue::from_static("id=1"));

        assert_eq!(header_credential(&headers).as_deref(), Some("id=1"));
    }

    #[test]
    fn legacy_id_from_query() {
        // ---
        let uri: Uri = "/api/auth/me?foo=bar&userId=12345".parse().unwrap();
        assert_eq!(query_legacy_id(&uri), Some(12345));

        let uri: Uri = "/api/auth/me?user_id=abc".parse().unwrap();
        assert_eq!(query_legacy_id(&uri), None);

        let uri: Uri = "/api/auth/me".parse().unwrap();
        assert_eq!(query_legacy_id(&uri), None);
    }

    #[test]
    fn legacy_id_from_json_body() {
        // ---
        assert_eq!(body_legacy_id(br#"{"telegram_id": 42}"#), Some(42));
        assert_eq!(body_legacy_id(br#"{"userId": "43"}"#), Some(43));
        assert_eq!(body_legacy_id(br#"{"user_id": true}"#), None);
        assert_eq!(body_legacy_id(b"not json"), None);
    }

    #[test]
    fn json_content_type_detection() {
        // ---
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(is_json(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
    }

    #[test]
    fn only_bodies_with_small_declared_length_are_buffered() {
        // ---
        let mut headers = HeaderMap::new();
        assert!(!body_fits(&headers));

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("18"));
        assert!(body_fits(&headers));

        let too_big = (LEGACY_BODY_LIMIT + 1).to_string();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_str(&too_big).unwrap());
        assert!(!body_fits(&headers));
    }

    #[tokio::test]
    async fn oversized_json_body_counts_as_no_credential() {
        // ---
        let body = format!(r#"{{"user_id": 7, "pad": "{}"}}"#, "x".repeat(LEGACY_BODY_LIMIT));
        let request = Request::builder()
            .uri("/api/auth/status")
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .body(Body::from(body.clone()))
            .unwrap();

        let (request, source) = extract_credential(request).await;
        assert_eq!(source, CredentialSource::Missing);

        let kept = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(kept.len(), body.len());
    }

    #[tokio::test]
    async fn small_json_body_is_put_back() {
        // ---
        let body = r#"{"user_id": 7}"#;
        let request = Request::builder()
            .uri("/api/auth/me")
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();

        let (request, source) = extract_credential(request).await;
        assert_eq!(source, CredentialSource::LegacyUserId(7));

        let kept = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&kept[..], body.as_bytes());
    }
}
