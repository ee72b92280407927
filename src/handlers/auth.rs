//! Identity endpoints.
//!
//! 1. `current_user` - GET /api/auth/me, requires authentication
//! 2. `auth_status`  - GET /api/auth/status, works with or without it

use crate::auth::{AuthenticatedUser, CurrentUser, MaybeUser, TrustTag};
use crate::domain::User;
use axum::Json;
use serde::Serialize;

// ============================================================================
// Response Types
// ============================================================================

/// Envelope for successful identity responses: `{ "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// The resolved identity as seen by the client.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    // ---
    pub user_id: i64,
    pub user: User,
    pub trust: TrustTag,
}

impl From<AuthenticatedUser> for MeResponse {
    fn from(auth: AuthenticatedUser) -> Self {
        // ---
        Self {
            user_id: auth.user_id,
            user: auth.user,
            trust: auth.trust,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    // ---
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub me: Option<MeResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/auth/me
///
/// Returns the user the gate resolved for this request. The route is wrapped
/// in `require_auth`, so unauthenticated requests never reach this handler.
pub async fn current_user(CurrentUser(auth): CurrentUser) -> Json<ApiResponse<MeResponse>> {
    // ---
    tracing::debug!(user_id = auth.user_id, "Serving current user");
    Json(ApiResponse { data: auth.into() })
}

/// GET /api/auth/status
///
/// Anonymous-friendly: reports whether the request carried an acceptable
/// credential and, if so, who it belongs to.
pub async fn auth_status(MaybeUser(auth): MaybeUser) -> Json<ApiResponse<StatusResponse>> {
    // ---
    Json(ApiResponse {
        data: StatusResponse {
            authenticated: auth.is_some(),
            me: auth.map(MeResponse::from),
        },
    })
}
