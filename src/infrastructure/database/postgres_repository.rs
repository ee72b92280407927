use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{ProfileFields, RepositoryPtr, StoreError, User, UserRepository};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    external_id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        // ---
        User {
            id: r.id,
            external_id: r.external_id,
            first_name: r.first_name,
            last_name: r.last_name,
            username: r.username,
            avatar_url: r.avatar_url,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const USER_COLUMNS: &str =
    "id, external_id, first_name, last_name, username, avatar_url, created_at, updated_at";

pub fn create_postgres_repository(pool: PgPool) -> RepositoryPtr {
    // ---
    std::sync::Arc::new(PostgresRepository::new(pool))
}

pub struct PostgresRepository {
    // ---
    pool: PgPool,
}

impl PostgresRepository {
    // ---
    pub fn new(pool: PgPool) -> Self {
        // ---
        Self { pool }
    }
}

fn store_err(err: sqlx::Error) -> StoreError {
    // ---
    StoreError::Store(err.into())
}

#[async_trait::async_trait]
impl UserRepository for PostgresRepository {
    // ---
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<User>, StoreError> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(User::from))
    }

    async fn insert(&self, external_id: i64, profile: &ProfileFields) -> Result<User, StoreError> {
        // ---
        let result = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (external_id, first_name, last_name, username, avatar_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(external_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.username)
        .bind(&profile.avatar_url)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateExternalId(external_id))
            }
            Err(err) => Err(store_err(err)),
        }
    }

    async fn update_profile(&self, id: i64, profile: &ProfileFields) -> Result<User, StoreError> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users
             SET first_name = $1, last_name = $2, username = $3, avatar_url = $4,
                 updated_at = NOW()
             WHERE id = $5
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.username)
        .bind(&profile.avatar_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(User::from)
            .ok_or_else(|| StoreError::Store(anyhow::anyhow!("user {id} disappeared during update")))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        // ---
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(())
    }
}
