//! PostgreSQL pool construction.
//!
//! The pool is built once by the process entry point and handed to the
//! repository; nothing here is global.

use crate::config::DatabaseConfig;
use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Delay between connection attempts while the database comes up.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Connects to PostgreSQL, retrying up to `retry_count` times, then runs
/// the embedded migrations.
///
/// # Errors
/// Returns the last connection error once all attempts are exhausted, or
/// the migration error if the schema cannot be applied.
pub async fn init_database_with_retry(config: &DatabaseConfig) -> Result<PgPool> {
    // ---
    let attempts = config.retry_count.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        // ---
        let result = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await;

        match result {
            Ok(pool) => {
                tracing::info!(attempt, "Connected to PostgreSQL");
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("failed to run database migrations")?;
                return Ok(pool);
            }
            Err(err) => {
                tracing::warn!(attempt, attempts, "Database not ready: {err}");
                last_err = Some(err);
                if attempt < attempts {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    Err(anyhow::anyhow!(
        "could not connect to database after {attempts} attempts: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}
