//! User directory: maps a Telegram id to the internal user record.
//!
//! Owns every write to `users`. The authentication gate only calls
//! [`UserDirectory::resolve`].

use crate::auth::TrustTag;
use crate::domain::{MetricsPtr, ProfileFields, RepositoryPtr, StoreError, User};

#[derive(Clone)]
pub struct UserDirectory {
    repository: RepositoryPtr,
    metrics: MetricsPtr,
}

impl UserDirectory {
    // ---
    pub fn new(repository: RepositoryPtr, metrics: MetricsPtr) -> Self {
        // ---
        Self {
            repository,
            metrics,
        }
    }

    /// Finds or creates the user for `external_id`.
    ///
    /// Existing rows get each non-empty profile field from `profile` and a
    /// fresh `updated_at`; missing rows are inserted with nulls for absent
    /// fields. A concurrent first login for the same id surfaces as
    /// [`StoreError::DuplicateExternalId`] from the insert and is retried
    /// once as a lookup, so only one row is ever created.
    ///
    /// # Errors
    /// [`StoreError::Store`] on any infrastructure failure.
    #[tracing::instrument(skip(self, profile))]
    pub async fn resolve(
        &self,
        external_id: i64,
        profile: &ProfileFields,
        trust: TrustTag,
    ) -> Result<User, StoreError> {
        // ---
        if let Some(existing) = self.repository.find_by_external_id(external_id).await? {
            return self.refresh(&existing, profile).await;
        }

        match self.repository.insert(external_id, &profile.for_insert()).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, external_id, %trust, "Created user on first login");
                self.metrics.record_user_created();
                Ok(user)
            }
            Err(StoreError::DuplicateExternalId(_)) => {
                tracing::debug!(external_id, "Lost first-login race; retrying as lookup");
                let existing = self
                    .repository
                    .find_by_external_id(external_id)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Store(anyhow::anyhow!(
                            "user {external_id} reported as duplicate but not found"
                        ))
                    })?;
                self.refresh(&existing, profile).await
            }
            Err(err) => Err(err),
        }
    }

    async fn refresh(&self, existing: &User, profile: &ProfileFields) -> Result<User, StoreError> {
        // ---
        let merged = profile.merged_over(existing);
        self.repository.update_profile(existing.id, &merged).await
    }
}
