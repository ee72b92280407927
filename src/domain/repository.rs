use super::user::{ProfileFields, User};
use std::sync::Arc;

/// Failures surfaced by a [`UserRepository`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    // ---
    /// An insert raced with another insert for the same external id.
    ///
    /// Recoverable: the caller should retry as a lookup.
    #[error("user with external id {0} already exists")]
    DuplicateExternalId(i64),

    /// Connectivity loss, query failure, or any other infrastructure fault.
    #[error("store failure: {0}")]
    Store(#[from] anyhow::Error),
}

/// Persistence for the `users` table.
///
/// Exactly three operation shapes are needed by the directory: point lookup
/// by external id, insert, and update by internal id.
#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    // ---
    /// Look up a user by Telegram id.
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<User>, StoreError>;

    /// Insert a new user. Fails with [`StoreError::DuplicateExternalId`]
    /// when the external id is already taken.
    async fn insert(&self, external_id: i64, profile: &ProfileFields) -> Result<User, StoreError>;

    /// Overwrite the mutable profile fields of an existing row and refresh
    /// its update timestamp.
    async fn update_profile(&self, id: i64, profile: &ProfileFields) -> Result<User, StoreError>;

    /// Cheap connectivity probe used by the full health check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Type alias for any backend that implements UserRepository.
pub type RepositoryPtr = Arc<dyn UserRepository>;
