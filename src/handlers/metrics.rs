use crate::app_state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

/// Handler for the `/metrics` endpoint.
///
/// Returns metrics in Prometheus text format for scraping. With the no-op
/// implementation the body is empty but the endpoint still answers 200.
pub async fn metrics_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    // ---
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        app_state.metrics().render(),
    )
}
