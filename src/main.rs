use anyhow::Result;
use health_tracker::{create_router_with_config, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber to log to stdout
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let app = create_router_with_config(&config).await?;

    let endpoint = &config.server.bind_addr;
    info!("Starting at endpoint:{}", endpoint);
    info!("Starting Health Tracker API server v{}...", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(endpoint).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // ---
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
