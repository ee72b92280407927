use axum::response::IntoResponse;

pub async fn root_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"Welcome to the Health Tracker API 👋
Version: {version}

Available endpoints:
  - GET    /api/auth/me       - Current user (requires Telegram initData)
  - GET    /api/auth/status   - Whether the request is authenticated
  - GET    /health            - Light health check
  - GET    /health?mode=full  - Full health check (includes the user store)
  - GET    /metrics           - Prometheus metrics

Authenticate by sending Telegram WebApp initData in the X-Telegram-Init-Data header.
"#
    )
}
