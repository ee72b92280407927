//! Authentication gate: credential in, resolved user out.
//!
//! Transport-agnostic; the axum wiring lives in `middleware.rs`.

use super::trust::{decide, TrustDecision, TrustTag};
use crate::config::AuthConfig;
use crate::directory::UserDirectory;
use crate::domain::{MetricsPtr, ProfileFields, RepositoryPtr, StoreError, User};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

/// Where the credential for a request came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Raw initData from one of the credential headers.
    InitData(String),

    /// Bare Telegram id sent by legacy clients. Trusted as-is.
    LegacyUserId(i64),

    Missing,
}

/// Identity attached to a request once the gate accepts it.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    /// Internal user id, for downstream queries.
    pub user_id: i64,
    pub user: User,
    pub trust: TrustTag,
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The credential was missing or not acceptable. Maps to 401.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The directory could not be reached. Maps to 500.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
struct RejectionBody {
    error: &'static str,
    reason: String,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        // ---
        match self {
            GateError::Unauthorized(reason) => (
                StatusCode::UNAUTHORIZED,
                Json(RejectionBody {
                    error: "Unauthorized",
                    reason,
                }),
            )
                .into_response(),
            GateError::Store(err) => {
                tracing::error!("User directory failure during authentication: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(RejectionBody {
                        error: "Internal server error",
                        reason: "user directory unavailable".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Runs the trust policy and the user directory for one request.
#[derive(Clone)]
pub struct AuthGate {
    config: Arc<AuthConfig>,
    directory: UserDirectory,
    metrics: MetricsPtr,
}

impl AuthGate {
    // ---
    pub fn new(config: AuthConfig, repository: RepositoryPtr, metrics: MetricsPtr) -> Self {
        // ---
        Self {
            config: Arc::new(config),
            directory: UserDirectory::new(repository, metrics.clone()),
            metrics,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        // ---
        &self.config
    }

    /// Resolves `source` to a user or rejects it.
    ///
    /// # Errors
    /// [`GateError::Unauthorized`] for any credential problem;
    /// [`GateError::Store`] only when the directory itself fails.
    pub async fn authenticate(&self, source: CredentialSource) -> Result<AuthenticatedUser, GateError> {
        // ---
        match source {
            CredentialSource::LegacyUserId(external_id) => self.authenticate_legacy(external_id).await,
            CredentialSource::InitData(raw) => self.authenticate_init_data(Some(&raw)).await,
            CredentialSource::Missing => self.authenticate_init_data(None).await,
        }
    }

    /// Like [`authenticate`](Self::authenticate) but never fails: any
    /// rejection or store error yields `None`.
    pub async fn authenticate_optional(&self, source: CredentialSource) -> Option<AuthenticatedUser> {
        // ---
        if source == CredentialSource::Missing {
            return None;
        }

        match self.authenticate(source).await {
            Ok(user) => Some(user),
            Err(GateError::Unauthorized(reason)) => {
                tracing::debug!("Optional authentication skipped: {reason}");
                None
            }
            Err(GateError::Store(err)) => {
                tracing::error!("Optional authentication skipped on store failure: {err}");
                None
            }
        }
    }

    async fn authenticate_init_data(&self, raw: Option<&str>) -> Result<AuthenticatedUser, GateError> {
        // ---
        let now = chrono::Utc::now().timestamp();

        let (profile, trust) = match decide(&self.config, raw, now) {
            TrustDecision::Accept { profile, trust } => (profile, trust),
            TrustDecision::Reject { reason } => {
                tracing::info!(%reason, "Authentication rejected");
                self.metrics.record_auth_attempt("rejected");
                return Err(GateError::Unauthorized(reason.to_string()));
            }
        };

        let user = self.directory.resolve(profile.id, &profile.fields(), trust).await?;
        self.audit(&user, trust);
        self.metrics.record_auth_attempt(trust.as_str());

        Ok(AuthenticatedUser {
            user_id: user.id,
            user,
            trust,
        })
    }

    async fn authenticate_legacy(&self, external_id: i64) -> Result<AuthenticatedUser, GateError> {
        // ---
        if !self.config.allow_legacy_user_id {
            self.metrics.record_auth_attempt("rejected");
            return Err(GateError::Unauthorized("legacy user id not accepted".to_string()));
        }

        tracing::warn!(external_id, "Accepting legacy user id without verification");
        let user = self
            .directory
            .resolve(external_id, &ProfileFields::default(), TrustTag::Unverified)
            .await?;
        self.metrics.record_auth_attempt("legacy");

        Ok(AuthenticatedUser {
            user_id: user.id,
            user,
            trust: TrustTag::Unverified,
        })
    }

    fn audit(&self, user: &User, trust: TrustTag) {
        // ---
        match trust {
            TrustTag::Verified => tracing::info!(
                user_id = user.id,
                external_id = user.external_id,
                %trust,
                "User authenticated"
            ),
            TrustTag::Unverified => tracing::warn!(
                user_id = user.id,
                external_id = user.external_id,
                %trust,
                environment = ?self.config.environment,
                "User authenticated without signature verification"
            ),
        }
    }
}
