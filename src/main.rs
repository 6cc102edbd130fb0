mod api;
mod config;
mod provider;
mod ranker;
mod route;
mod safety;
mod scorer;

use anyhow::Context;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::provider::DirectionsClient;
use crate::ranker::ScoreRange;
use crate::safety::BlackspotMap;
use crate::scorer::RiskScorer;

// Shared, read-only across requests
pub struct AppState {
    pub scorer: RiskScorer,
    pub directions: DirectionsClient,
    pub api_key: Option<String>,
    pub score_range: ScoreRange,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Configuration
    let config = AppConfig::from_env().context("invalid configuration")?;
    if config.api_key.is_none() {
        warn!("GOOGLE_MAPS_API_KEY is not set; /api/route will answer with CONFIG_ERROR");
    }

    // 2. Blackspots
    let blackspots = BlackspotMap::from_path(&config.blackspots_path).with_context(|| {
        format!("failed to load blackspots from {}", config.blackspots_path.display())
    })?;
    if blackspots.is_empty() {
        warn!("blackspot list is empty; proximity scoring is disabled");
    }
    info!("Loaded {} blackspots from {}", blackspots.len(), config.blackspots_path.display());

    // 3. Directions provider
    let directions = DirectionsClient::new(&config.directions_url, config.provider_timeout)
        .context("failed to build directions client")?;

    let shared_state = Arc::new(AppState {
        scorer: RiskScorer::new(blackspots),
        directions,
        api_key: config.api_key.clone(),
        score_range: config.score_range,
    });

    let app = build_router(shared_state);

    info!("API server running on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    // Browser clients call this API from other origins.
    let cors = CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_origin(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(api::home))
        .route("/health", get(|| async { "OK" }))
        .route("/api/route", get(api::get_route))
        .route("/api/autocomplete", get(api::autocomplete))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
