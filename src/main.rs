//! Grid Proxy - read-through cache for live node data
//!
//! Serves node details out of a durable cache and warms it for the whole fleet.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grid_proxy::api::create_router;
use grid_proxy::cache::{DurableStore, HttpStore, MemoryStore};
use grid_proxy::directory::{Directory, GraphQlDirectory};
use grid_proxy::node::RelayNodeClient;
use grid_proxy::{
    spawn_purge_task, AppState, Config, FleetWarmer, NodeCache, NodeDataFetcher, TwinCache,
    TwinResolver,
};

/// Main entry point for the grid proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the twin cache, durable store and remote clients
/// 4. Start the purge tasks and the fleet warmer
/// 5. Serve the Axum router on the configured port
/// 6. On SIGINT/SIGTERM, stop the warmer and purge tasks
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grid_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Grid Proxy");

    let config = Config::from_env();
    info!(
        explorer = %config.explorer_url,
        relay = %config.relay_url,
        store = config.store_url.as_deref().unwrap_or("memory"),
        port = config.server_port,
        "Configuration loaded"
    );

    let mut purge_handles = Vec::new();

    let twins = TwinCache::new();
    purge_handles.push(spawn_purge_task(
        twins.inner(),
        Duration::from_secs(config.twin_cache_purge_interval),
        "twin cache",
    ));

    let store: Arc<dyn DurableStore> = match &config.store_url {
        Some(url) => {
            info!(store = %url, "Using remote node cache store");
            Arc::new(HttpStore::new(url.clone(), Duration::from_secs(config.directory_timeout))?)
        }
        None => {
            let memory = MemoryStore::new(config.store_max_entries);
            purge_handles.push(spawn_purge_task(
                memory.inner(),
                config.node_cache_ttl(),
                "node cache",
            ));
            Arc::new(memory)
        }
    };

    let directory: Arc<dyn Directory> = Arc::new(GraphQlDirectory::new(
        config.explorer_url.clone(),
        Duration::from_secs(config.directory_timeout),
    )?);
    let resolver = TwinResolver::new(
        directory.clone(),
        twins,
        Duration::from_secs(config.twin_cache_ttl),
    );
    let client = Arc::new(RelayNodeClient::new(
        config.relay_url.clone(),
        config.fetch_timeout(),
    ));
    let fetcher = NodeDataFetcher::new(resolver, client, config.fetch_timeout());
    let cache = NodeCache::new(store, fetcher, config.node_cache_ttl());

    let warmer =
        FleetWarmer::new(directory.clone(), cache.clone(), config.warm_interval()).spawn();

    let app = create_router(AppState::new(cache, directory));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    warmer.shutdown().await;
    stop_purge_tasks(purge_handles);

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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

fn stop_purge_tasks(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        handle.abort();
    }
    warn!("Purge tasks aborted");
}
