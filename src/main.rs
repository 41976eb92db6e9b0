//! ttlkv - An In-Memory Key-Value Store with Per-Key TTL
//!
//! This is the main entry point for the ttlkv server.
//! It loads the snapshot, sweeps expired entries and serves HTTP requests.

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ttlkv::storage::TtlStore;
use ttlkv::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("ttlkv v{}", ttlkv::VERSION);

    // Build the store and restore state before accepting requests
    let store = Arc::new(TtlStore::with_file(&config.snapshot).with_default_ttl(config.default_ttl));
    let report = store.bootstrap();
    info!(
        snapshot = %config.snapshot.display(),
        loaded = report.loaded,
        expired = report.expired,
        "Store ready"
    );

    let listener = TcpListener::bind(config.bind_address()).await?;

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    ttlkv::http::serve(listener, Arc::clone(&store), shutdown).await?;

    let stats = store.stats();
    info!(
        keys = stats.keys,
        puts = stats.put_ops,
        deletes = stats.del_ops,
        expired = stats.expired,
        storage_failures = stats.storage_failures,
        "Server shutdown complete"
    );
    Ok(())
}
