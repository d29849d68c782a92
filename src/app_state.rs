//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::engine::PairingEngine;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Matching engine holding the pool, ledger, and live sessions.
    pub engine: Arc<PairingEngine>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}
