//! System endpoints: health check and engine configuration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Effective engine tuning values.
#[derive(Debug, Serialize, ToSchema)]
struct EngineConfigInfo {
    lookback_rounds: u64,
    acceptance_window_secs: u64,
    session_duration_secs: u64,
    starvation_threshold_rounds: u64,
    match_search_threshold: usize,
    idle_evict_secs: u64,
}

/// `GET /config/engine` — Effective engine configuration.
#[utoipa::path(
    get,
    path = "/config/engine",
    tag = "System",
    summary = "Show engine configuration",
    description = "Returns the tuning values the matching engine is running with.",
    responses(
        (status = 200, description = "Engine configuration", body = EngineConfigInfo),
    )
)]
pub async fn engine_config_handler(State(state): State<AppState>) -> impl IntoResponse {
    let cfg = state.engine.config();
    (
        StatusCode::OK,
        Json(EngineConfigInfo {
            lookback_rounds: cfg.lookback_rounds,
            acceptance_window_secs: cfg.acceptance_window_secs,
            session_duration_secs: cfg.session_duration_secs,
            starvation_threshold_rounds: cfg.starvation_threshold_rounds,
            match_search_threshold: cfg.search_threshold,
            idle_evict_secs: cfg.idle_evict_secs,
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/engine", get(engine_config_handler))
}
