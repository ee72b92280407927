//! Application state management.
//!
//! This module defines the shared state structure that gets passed to all
//! Axum handlers via the `State` extractor. The `AppState` contains the
//! user store, the metrics implementation and the authentication gate.
//!
//! The state is cheaply cloneable (using `Arc` internally) so it can be
//! passed to each request handler without copying resources.

use crate::auth::AuthGate;
use crate::config::AuthConfig;
use crate::domain::{MetricsPtr, RepositoryPtr};

/// Shared application state passed to all Axum handlers.
///
/// This struct serves as the Dependency Injection container for the application.
///
/// # Design Principles
///
/// - **Dependency Inversion**: Handlers depend on abstractions (UserRepository trait),
///   not concrete implementations (PostgresRepository).
/// - **Immutable After Initialization**: State is built once at startup and
///   never mutated.
/// - **Cheap Cloning**: All heavy resources are wrapped in `Arc`.
///
/// # Lifecycle
///
/// 1. Created once by the process entry point (or by a test)
/// 2. Attached to the Axum router via `.with_state(app_state)`
/// 3. Cloned automatically by Axum for each incoming HTTP request
#[derive(Clone)]
pub struct AppState {
    /// Metrics implementation for recording application events.
    ///
    /// Either Prometheus-backed (production) or no-op (testing/development).
    metrics: MetricsPtr,

    /// User store. Backed by PostgreSQL or the in-memory map.
    repository: RepositoryPtr,

    /// Trust policy plus user directory, shared by both auth middlewares.
    gate: AuthGate,
}

impl AppState {
    // ---

    pub fn new(auth: AuthConfig, repository: RepositoryPtr, metrics: MetricsPtr) -> Self {
        // ---
        AppState {
            gate: AuthGate::new(auth, repository.clone(), metrics.clone()),
            metrics,
            repository,
        }
    }

    /// Get a reference to the metrics implementation.
    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }

    /// Get a reference to the repository implementation.
    pub(crate) fn repository(&self) -> &RepositoryPtr {
        // ---
        &self.repository
    }

    /// Get a reference to the authentication gate.
    pub(crate) fn gate(&self) -> &AuthGate {
        // ---
        &self.gate
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::infrastructure::{create_memory_repository, create_noop_metrics};

    #[test]
    fn test_app_state_creation_and_clone() {
        // ---
        let metrics = create_noop_metrics().unwrap();
        let repository = create_memory_repository();

        let app_state = AppState::new(AuthConfig::production(Some("token")), repository, metrics);
        let cloned = app_state.clone();

        let _metrics_ref = cloned.metrics();
        let _repo_ref = cloned.repository();
        assert!(cloned.gate().config().has_bot_token());
    }

    #[tokio::test]
    async fn test_repository_ping_through_state() {
        // ---
        let app_state = AppState::new(
            AuthConfig::production(None),
            create_memory_repository(),
            create_noop_metrics().unwrap(),
        );

        assert!(app_state.repository().ping().await.is_ok());
    }
}
