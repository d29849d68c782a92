//! Background task recording events and round checkpoints.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::postgres::PostgresPersistence;
use crate::domain::{EventBus, PairingEvent};
use crate::engine::PairingEngine;

/// Spawns a task that appends every event to the log and checkpoints
/// the engine state after each completed round.
///
/// The task exits when the event bus is dropped. Database failures are
/// logged and skipped so a flaky store never stalls the engine.
pub fn spawn(
    persistence: PostgresPersistence,
    event_bus: &EventBus,
    engine: Arc<PairingEngine>,
) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => record(&persistence, &engine, &event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event recorder lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("event recorder stopped");
    })
}

async fn record(persistence: &PostgresPersistence, engine: &PairingEngine, event: &PairingEvent) {
    let payload = match serde_json::to_value(event) {
        Ok(value) => value,
        Err(error) => {
            tracing::error!(%error, "failed to serialize event for persistence");
            return;
        }
    };

    if let Err(error) = persistence.save_event(event.event_type_str(), &payload).await {
        tracing::error!(%error, event_type = event.event_type_str(), "failed to persist event");
    }

    if matches!(event, PairingEvent::RoundCompleted { .. }) {
        let snapshot = engine.snapshot().await;
        match persistence.save_snapshot(&snapshot).await {
            Ok(id) => tracing::debug!(snapshot_id = id, round = snapshot.round, "checkpointed"),
            Err(error) => tracing::error!(%error, "failed to checkpoint engine state"),
        }
    }
}
