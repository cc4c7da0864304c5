//! Shardcache demonstration server
//!
//! Serves the cache over HTTP with TTL expiration and LRU eviction.

use std::net::SocketAddr;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shardcache::{create_router, AppState, Cache, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache (spawns the background reaper)
/// 4. Create the Axum router with all endpoints
/// 5. Start the HTTP server on the configured port
/// 6. On SIGINT/SIGTERM, drain the server and close the cache
#[tokio::main]
async fn main() {
    // Defaults to "info" level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shardcache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_memory={}B, shards={}, default_ttl={:?}, cleanup_interval={:?}",
        config.max_memory_bytes, config.shard_count, config.default_ttl, config.cleanup_interval
    );

    let cache = Cache::new(config).expect("invalid cache configuration");
    info!("Cache initialized, reaper running");

    let state = AppState::new(cache.clone());
    let app = create_router(state);

    let port: u16 = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind server port");
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // Drained; stop the reaper and reject further mutations
    if let Err(err) = cache.close().await {
        info!("Cache already closed: {}", err);
    }
    info!("Server shutdown complete");
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
