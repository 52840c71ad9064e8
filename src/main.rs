// Initialize configuration
// Set up logging
// Wire upstream clients, caches and adapters
// Start HTTP server with graceful shutdown

use chain_gas_service::{api, config::Config, state::AppState};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting chain-gas-service");

    // Load configuration
    let config = Config::from_env();
    let enabled = config.enabled_chains();
    if enabled.is_empty() {
        tracing::warn!("Neither ETHERSCAN_API_KEY nor MORALIS_API_KEY is set; every request will fail");
    }
    tracing::info!(
        "Configuration loaded: {} chains enabled, response cache TTL {:?}, price refresh {:?}",
        enabled.len(),
        config.response_cache_ttl,
        config.price_refresh_interval
    );

    // Create shared state
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let app_state = Arc::new(AppState::from_config(config)?);

    // Shut down on Ctrl-C
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        signal.cancel();
    });

    // Start HTTP server
    let app = api::create_router(app_state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
