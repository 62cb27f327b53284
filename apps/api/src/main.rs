mod assistant;
mod config;
mod draft;
mod errors;
mod export;
mod model;
mod render;
mod routes;
mod session;
mod state;
mod templates;
mod wizard;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistant::AssistantClient;
use crate::config::Config;
use crate::draft::{DraftStore, FileDraftStore, HttpDraftApi, RemoteDraftApi};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Builder API v{}", env!("CARGO_PKG_VERSION"));

    // Local-first draft store, with an optional best-effort remote mirror
    let local_store = Arc::new(FileDraftStore::new(&config.data_dir));
    let remote_api: Option<Arc<dyn RemoteDraftApi>> =
        config.remote_draft_api_url.clone().map(|url| {
            info!("Remote draft mirror enabled at {url}");
            Arc::new(HttpDraftApi::new(url, Duration::from_secs(10))) as Arc<dyn RemoteDraftApi>
        });
    let drafts = DraftStore::new(local_store, remote_api);
    info!("Draft store initialized (data dir: {})", config.data_dir.display());

    // Content assistant client
    let assistant = AssistantClient::new(
        config.assistant_api_url.clone(),
        config.assistant_api_key.clone(),
        Duration::from_secs(config.assistant_timeout_secs),
    );
    info!("Assistant client initialized ({})", config.assistant_api_url);

    // Build app state
    let state = AppState {
        sessions: Arc::new(RwLock::new(HashMap::new())),
        drafts,
        assistant,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
