//! pairlink server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints, the
//! optional round scheduler, and the optional PostgreSQL recorder.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pairlink::api;
use pairlink::app_state::AppState;
use pairlink::config::ServiceConfig;
use pairlink::domain::EventBus;
use pairlink::engine::{self, PairingEngine};
use pairlink::persistence::postgres::PostgresPersistence;
use pairlink::persistence::recorder;
use pairlink::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ServiceConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting pairlink");

    // Build engine
    let event_bus = EventBus::new(config.event_bus_capacity);
    let engine = Arc::new(PairingEngine::new(config.engine.clone(), event_bus.clone()));

    // Optional persistence: restore the last checkpoint and record
    // events going forward.
    if config.persistence_enabled {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await?;
        let persistence = PostgresPersistence::new(pool);
        persistence.init_schema().await?;

        if let Some(snapshot) = persistence.load_latest_snapshot().await? {
            tracing::info!(round = snapshot.round, "restoring engine state from checkpoint");
            engine.restore(snapshot).await;
        }

        recorder::spawn(persistence, &event_bus, Arc::clone(&engine));
    }

    // Optional automatic rounds
    if config.scheduler_enabled {
        engine::scheduler::spawn(
            Arc::clone(&engine),
            config.round_interval_secs,
            config.min_pool_size,
        );
    }

    // Build application state
    let app_state = AppState {
        engine,
        event_bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
