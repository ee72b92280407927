// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.trim().parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

/// Reads an optional string variable, treating blank values as unset.
macro_rules! optional_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
/// All required configuration is validated eagerly during initialization.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: store::StoreConfig,
    pub auth: auth::AuthConfig,
    pub server: server::ServerConfig,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        Ok(Self {
            store: store::StoreConfig::from_env()?,
            auth: auth::AuthConfig::from_env(),
            server: server::ServerConfig::from_env(),
        })
    }
}

// ============================================================
// Store configuration
// ============================================================

mod store {
    // ---
    use super::*;

    /// Which [`UserRepository`](crate::domain::UserRepository) backs the directory.
    #[derive(Debug, Clone)]
    pub enum StoreConfig {
        /// PostgreSQL via sqlx. The default.
        Postgres(DatabaseConfig),

        /// Process-local map. Data is lost on restart.
        Memory,
    }

    impl StoreConfig {
        /// Selects the store from `APP_STORE_TYPE` (`postgres` or `memory`).
        ///
        /// # Errors
        /// Returns an error if the postgres store is selected and its
        /// configuration is incomplete.
        pub fn from_env() -> Result<Self> {
            // ---
            let store_type = std::env::var("APP_STORE_TYPE").unwrap_or_else(|_| "postgres".into());
            match store_type.trim().to_ascii_lowercase().as_str() {
                "memory" => Ok(Self::Memory),
                "postgres" => Ok(Self::Postgres(DatabaseConfig::from_env()?)),
                other => Err(anyhow::anyhow!("Unknown APP_STORE_TYPE: {other}")),
            }
        }
    }

    /// Database-related configuration derived from environment variables.
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        /// PostgreSQL connection string.
        pub database_url: String,

        /// Number of retry attempts when initializing the database connection. Defaults to 50.
        pub retry_count: u32,

        /// Maximum time to wait when acquiring a connection from the pool. Defaults to 30 seconds.
        pub acquire_timeout: Duration,

        /// Minimum number of connections to keep in the pool, even when idle. Defaults to 2.
        pub min_connections: u32,

        /// Maximum number of connections open concurrently. Defaults to 15.
        pub max_connections: u32,
    }

    impl DatabaseConfig {
        /// Builds a [`DatabaseConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if `DATABASE_URL` is missing.
        pub fn from_env() -> Result<Self> {
            // ---
            let database_url = required_env!("DATABASE_URL");
            let retry_count = optional_env_parse!("APP_DB_RETRY_COUNT", u32, 50);
            let acquire_timeout_secs = optional_env_parse!("APP_DB_ACQUIRE_TIMEOUT_SEC", u64, 30);
            let min_connections = optional_env_parse!("APP_DB_MIN_CONNECTIONS", u32, 2);
            let max_connections = optional_env_parse!("APP_DB_MAX_CONNECTIONS", u32, 15);

            Ok(Self {
                database_url,
                retry_count,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                min_connections,
                max_connections,
            })
        }
    }
}
pub use store::{DatabaseConfig, StoreConfig};

// ============================================================
// Authentication configuration
// ============================================================

mod auth {
    // ---
    use super::*;

    /// Default credential accepted as a bypass in development mode.
    pub const DEFAULT_DEV_SENTINEL: &str = "dev_init_data";

    /// Deployment mode. Only `Development` enables the bypass and fallback paths.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Environment {
        Production,
        Development,
    }

    impl Environment {
        /// `development` and `dev` (any case) select development mode;
        /// everything else, including an unset variable, is production.
        pub fn parse(value: Option<&str>) -> Self {
            // ---
            match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
                Some("development") | Some("dev") => Self::Development,
                _ => Self::Production,
            }
        }

        pub fn is_development(self) -> bool {
            // ---
            self == Self::Development
        }
    }

    /// Telegram authentication policy.
    ///
    /// Built once at startup and injected into the authentication gate.
    #[derive(Clone)]
    pub struct AuthConfig {
        /// Deployment mode (`APP_ENV`).
        pub environment: Environment,

        /// Bot token used to derive the HMAC key (`TELEGRAM_BOT_TOKEN`).
        /// `None` is a valid, handled state.
        pub bot_token: Option<String>,

        /// Credential accepted without verification in development mode.
        pub dev_sentinel: String,

        /// Maximum accepted age of `auth_date`. `None` disables the check.
        pub max_age: Option<Duration>,

        /// Whether the gate accepts a bare numeric user id (legacy clients).
        pub allow_legacy_user_id: bool,
    }

    impl AuthConfig {
        /// Builds an [`AuthConfig`] from environment variables.
        ///
        /// Nothing here is required: a missing bot token selects the
        /// unverified fallback path instead of failing startup.
        pub fn from_env() -> Self {
            // ---
            let environment = Environment::parse(std::env::var("APP_ENV").ok().as_deref());
            let bot_token = optional_env!("TELEGRAM_BOT_TOKEN");
            let dev_sentinel =
                optional_env!("AUTH_DEV_SENTINEL").unwrap_or_else(|| DEFAULT_DEV_SENTINEL.into());
            let max_age_secs = optional_env_parse!("AUTH_MAX_AGE_SEC", u64, 0);
            let allow_legacy_user_id = optional_env_parse!("AUTH_ALLOW_LEGACY_USER_ID", bool, true);

            Self {
                environment,
                bot_token,
                dev_sentinel,
                max_age: (max_age_secs > 0).then(|| Duration::from_secs(max_age_secs)),
                allow_legacy_user_id,
            }
        }

        /// Production policy with the given bot token; used by tests and embedders.
        pub fn production(bot_token: Option<&str>) -> Self {
            // ---
            Self {
                environment: Environment::Production,
                bot_token: bot_token
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
                dev_sentinel: DEFAULT_DEV_SENTINEL.to_string(),
                max_age: None,
                allow_legacy_user_id: true,
            }
        }

        /// Development policy with the given bot token.
        pub fn development(bot_token: Option<&str>) -> Self {
            // ---
            Self {
                environment: Environment::Development,
                ..Self::production(bot_token)
            }
        }

        pub fn has_bot_token(&self) -> bool {
            // ---
            self.bot_token.is_some()
        }
    }

    // The bot token must never reach the logs.
    impl std::fmt::Debug for AuthConfig {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            // ---
            f.debug_struct("AuthConfig")
                .field("environment", &self.environment)
                .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
                .field("dev_sentinel", &self.dev_sentinel)
                .field("max_age", &self.max_age)
                .field("allow_legacy_user_id", &self.allow_legacy_user_id)
                .finish()
        }
    }
}
pub use auth::{AuthConfig, Environment, DEFAULT_DEV_SENTINEL};

// ============================================================
// Server configuration
// ============================================================

mod server {
    // ---

    /// HTTP listener configuration.
    #[derive(Debug, Clone)]
    pub struct ServerConfig {
        /// Socket address to bind. Defaults to `127.0.0.1:8080`.
        pub bind_addr: String,
    }

    impl ServerConfig {
        pub fn from_env() -> Self {
            // ---
            let bind_addr =
                std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
            Self { bind_addr }
        }
    }
}
pub use server::ServerConfig;

// ============================================================
// Tests
// ============================================================
