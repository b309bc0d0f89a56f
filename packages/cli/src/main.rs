use axum::http::Method;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;
use opsdash_api::{create_router, AppState};
use opsdash_core::insight::InsightStore;
use opsdash_core::{StateStore, UpdateNotifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // State is ephemeral by design; every start reseeds the topology.
    let store = StateStore::new();
    let notifier = UpdateNotifier::new(
        store.clone(),
        Duration::from_millis(config.update_interval_ms),
    );
    let insight = InsightStore::default();

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<axum::http::HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = create_router(AppState::new(store, notifier, insight)).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, interval_ms = config.update_interval_ms, "opsdash server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
