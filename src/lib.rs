// src/lib.rs
use anyhow::Result;
use axum::{middleware, routing::get, Router};

use handlers::{auth_status, current_user, health_check, metrics_handler, root_handler};

// Public exports (visible outside this module)
pub mod auth;
pub mod domain;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod directory;
mod handlers;
mod infrastructure;

// Hoist up only the public symbol(s)
pub use app_state::AppState;
pub use directory::UserDirectory;

pub use config::*;

// Publicly expose the infrastructure creation functions
pub use infrastructure::{
    create_memory_repository, // ---
    create_noop_metrics,
    create_postgres_repository,
    create_prom_metrics,
    init_database_with_retry,
};

/// Build the HTTP router from environment configuration.
///
/// Selects the metrics implementation from `APP_METRICS_TYPE` and the user
/// store from `APP_STORE_TYPE`, connecting to PostgreSQL when needed.
///
/// # Errors
/// Fails on missing configuration or when the database cannot be reached.
pub async fn create_router() -> Result<Router> {
    // ---
    let config = AppConfig::from_env()?;
    create_router_with_config(&config).await
}

/// Build the HTTP router from an already-loaded configuration.
///
/// # Errors
/// Fails when the metrics recorder or the database cannot be initialized.
pub async fn create_router_with_config(config: &AppConfig) -> Result<Router> {
    // ---
    tracing_subscriber::fmt::try_init().ok(); // Ignores if already initialized

    let metrics_type = std::env::var("APP_METRICS_TYPE").unwrap_or_else(|_| "noop".to_string());
    let metrics = if metrics_type == "prom" {
        create_prom_metrics()?
    } else {
        create_noop_metrics()?
    };

    let repository = match &config.store {
        StoreConfig::Postgres(database) => {
            let pool = init_database_with_retry(database).await?;
            create_postgres_repository(pool)
        }
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory user store; users are lost on restart");
            create_memory_repository()
        }
    };

    if !config.auth.has_bot_token() {
        tracing::warn!(
            environment = ?config.auth.environment,
            "TELEGRAM_BOT_TOKEN is not set; credentials will be accepted without verification"
        );
    }

    let app_state = AppState::new(config.auth.clone(), repository, metrics);
    Ok(build_router(app_state))
}

/// Assemble routes around an explicitly constructed [`AppState`].
pub fn build_router(app_state: AppState) -> Router {
    // ---
    let protected = Router::new()
        .route("/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_auth,
        ));

    let personalized = Router::new()
        .route("/status", get(auth_status))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::optional_auth,
        ));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/auth", protected.merge(personalized))
        .with_state(app_state)
}
