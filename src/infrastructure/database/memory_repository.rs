//! In-process user store.
//!
//! Mirrors the PostgreSQL table semantics: internal ids come from a
//! sequence and `external_id` is unique. Selected with `APP_STORE_TYPE=memory`.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{ProfileFields, RepositoryPtr, StoreError, User, UserRepository};

pub fn create_memory_repository() -> RepositoryPtr {
    // ---
    Arc::new(MemoryRepository::default())
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: HashMap<i64, User>,
    by_external_id: HashMap<i64, i64>,
}

#[derive(Default)]
pub struct MemoryRepository {
    // ---
    tables: Mutex<Tables>,
}

#[async_trait::async_trait]
impl UserRepository for MemoryRepository {
    // ---
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<User>, StoreError> {
        // ---
        let tables = self.tables.lock().await;
        Ok(tables
            .by_external_id
            .get(&external_id)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn insert(&self, external_id: i64, profile: &ProfileFields) -> Result<User, StoreError> {
        // ---
        let mut tables = self.tables.lock().await;
        if tables.by_external_id.contains_key(&external_id) {
            return Err(StoreError::DuplicateExternalId(external_id));
        }

        tables.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_id,
            external_id,
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            username: profile.username.clone(),
            avatar_url: profile.avatar_url.clone(),
            created_at: now,
            updated_at: now,
        };

        tables.by_external_id.insert(external_id, user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: i64, profile: &ProfileFields) -> Result<User, StoreError> {
        // ---
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::Store(anyhow::anyhow!("user {id} disappeared during update")))?;

        user.first_name = profile.first_name.clone();
        user.last_name = profile.last_name.clone();
        user.username = profile.username.clone();
        user.avatar_url = profile.avatar_url.clone();
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        // ---
        Ok(())
    }
}
