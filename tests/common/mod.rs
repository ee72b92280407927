// Test helpers are intentionally partially used
#![allow(dead_code)]

use health_tracker::{
    build_router, create_memory_repository, create_noop_metrics, create_router, AppState, AuthConfig,
};
use reqwest::Client;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

/// Bot token shared by the signed fixtures below.
pub const BOT_TOKEN: &str = "botsecret";

/// Login Widget style credential for user 555, signed with [`BOT_TOKEN`].
pub const JANE: &str = "auth_date=1700000000&first_name=Jane&id=555&hash=4e5839cecd7465b7bfaa40852763781952e1b667b815692ffc15b66dba887813";

/// Same as [`JANE`] with the id changed after signing.
pub const JANE_FORGED: &str = "auth_date=1700000000&first_name=Jane&id=556&hash=4e5839cecd7465b7bfaa40852763781952e1b667b815692ffc15b66dba887813";

/// Mini-app credential with a JSON `user` field for user 42, signed with [`BOT_TOKEN`].
pub const ANN: &str = "auth_date=1700000000&query_id=AAH&user=%7B%22id%22%3A42%2C%22first_name%22%3A%22Ann%22%2C%22username%22%3A%22ann%22%7D&hash=2fb6f1d199b63377337a6ae9514f1d2989bbbf269974733fb161125dd54157f4";

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub client: Client,
}

impl TestServer {
    // ---

    /// Production mode with [`BOT_TOKEN`] configured.
    pub async fn new() -> Self {
        // ---
        Self::with_auth(AuthConfig::production(Some(BOT_TOKEN))).await
    }

    /// Serves the full router over the in-memory store with `auth`.
    pub async fn with_auth(auth: AuthConfig) -> Self {
        // ---
        let metrics = create_noop_metrics().expect("noop metrics");
        Self::serve(build_router(AppState::new(auth, create_memory_repository(), metrics))).await
    }

    /// Builds the router the way the binary does, from environment variables.
    pub async fn from_env() -> Self {
        // ---
        let app = create_router().await.expect("Should be able to create router");
        Self::serve(app).await
    }

    async fn serve(app: axum::Router) -> Self {
        // ---
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Spawn the server in the background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start
        sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { addr, client }
    }

    pub fn url(&self, path: &str) -> String {
        // ---
        format!("http://{}{}", self.addr, path)
    }
}
