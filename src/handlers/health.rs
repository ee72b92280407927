use crate::app_state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(serde::Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct HealthQuery {
    mode: Option<String>,
}

/// Responds with the health status of the server.
///
/// - By default (no query parameters), performs a light check to confirm the web server
///   is running.
///
/// - If `mode=full` is passed as a query parameter, also pings the user store to
///   verify database connectivity.
///
/// # Responses
/// - `200 OK` with `{ "status": "ok" }` if server (and store, in full mode) are healthy.
/// - `500 INTERNAL SERVER ERROR` with `{ "status": "error" }` if the store ping fails in full mode.
pub async fn health_check(
    State(state): State<AppState>,
    Query(params): Query<HealthQuery>,
) -> (StatusCode, Json<HealthResponse>) {
    match params.mode.as_deref() {
        Some("full") => match state.repository().ping().await {
            Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
            Err(err) => {
                tracing::error!("Health check store ping failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(HealthResponse { status: "error" }),
                )
            }
        },
        _ => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
    }
}
