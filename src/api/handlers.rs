//! API Handlers
//!
//! HTTP request handlers for each calculation service endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{extract::State, Json};

use crate::cache::{CacheStore, Coordinator};
use crate::config::Config;
use crate::error::Result;
use crate::models::{CalculateRequest, CalculateResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// The cache store is owned here and injected into the coordinator at
/// construction; there is no process-wide singleton, so tests can build
/// isolated instances.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store (shared with the background cleanup task)
    pub cache: Arc<RwLock<CacheStore>>,
    /// Single-flight resolver over the store
    pub coordinator: Arc<Coordinator>,
}

impl AppState {
    /// Creates a new AppState over the given cache store.
    pub fn new(store: CacheStore, default_ttl: u64) -> Self {
        let cache = Arc::new(RwLock::new(store));
        let coordinator = Arc::new(Coordinator::new(cache.clone(), default_ttl));
        Self { cache, coordinator }
    }

    /// Creates a new AppState from configuration, opening the store at the
    /// configured directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = CacheStore::open(&config.cache_dir, config.max_entries)?;
        Ok(Self::new(store, config.default_ttl))
    }
}

/// Handler for POST /calculate
///
/// Validates the request body, resolves it through the coordinator and
/// returns the numeric result with cache metadata.
pub async fn calculate_handler(
    State(state): State<AppState>,
    Json(req): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>> {
    let request = req.validate()?;
    let resolved = state
        .coordinator
        .resolve(&request, req.ttl, req.no_cache)
        .await?;

    Ok(Json(CalculateResponse::new(resolved)))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    let stats = cache.stats();

    Json(StatsResponse::new(&stats))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
