//! Authgate API Server
//!
//! Author: hephaex@gmail.com

use authgate_api::{create_router, state::AppState};
use authgate_core::AppConfig;
use authgate_kv::{KeyValueStore, MemoryStore, RedisStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env().unwrap_or_default();

    // Initialize tracing; RUST_LOG overrides the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Connect the key-value backend. Refresh-token storage is a soft
    // dependency of the service as a whole, so an unreachable Redis degrades
    // to an in-process store instead of aborting startup.
    let kv: Arc<dyn KeyValueStore> = match RedisStore::connect(&config.redis.url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("Redis unavailable ({e}), falling back to in-process token store");
            tracing::warn!("Refresh tokens will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Create application state; signing misconfiguration is fatal here
    let state = Arc::new(AppState::new(config, kv).inspect_err(|e| {
        tracing::error!("Failed to initialize token codec: {e}");
    })?);

    // Seed development accounts
    state.seed_default_users().await;

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Authgate API Server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
