//! Periodic round trigger.
//!
//! Rounds can be triggered externally via `POST /rounds`, but most
//! deployments run this scheduler: an interval task that executes a
//! round whenever the queued pool reaches the configured threshold.
//! Starvation is surfaced, never auto-resolved — the scheduler logs it
//! and leaves the lookback decision to the operator.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::pairing_engine::PairingEngine;
use crate::error::EngineError;

/// Spawns the round scheduler task.
///
/// Every `interval_secs`, a round runs if at least `min_pool_size`
/// participants are queued. The returned handle can be aborted on
/// shutdown.
pub fn spawn(
    engine: Arc<PairingEngine>,
    interval_secs: u64,
    min_pool_size: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let queued = engine.queued_count().await;
            if queued < min_pool_size {
                tracing::trace!(queued, min_pool_size, "pool below threshold, skipping round");
                continue;
            }
            match engine.run_round(None).await {
                Ok(report) => {
                    tracing::debug!(
                        round = report.round,
                        pairs = report.pairs.len(),
                        unmatched = report.unmatched.len(),
                        "scheduled round executed"
                    );
                }
                Err(EngineError::StarvationDetected { starving, round }) => {
                    tracing::warn!(
                        round,
                        starving = ?starving,
                        "starvation detected; widen the lookback via POST /rounds"
                    );
                }
                Err(error) => {
                    tracing::error!(%error, "scheduled round failed");
                }
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::domain::{EventBus, ParticipantId};

    #[tokio::test(start_paused = true)]
    async fn scheduler_runs_round_once_threshold_met() {
        let engine = Arc::new(PairingEngine::new(
            EngineConfig::default(),
            EventBus::new(16),
        ));
        let handle = spawn(Arc::clone(&engine), 5, 2);

        // Below threshold: ticks pass without a round.
        let joined = engine.join(ParticipantId::new("a")).await;
        assert!(joined.is_ok());
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(engine.current_round().await, 0);

        let joined = engine.join(ParticipantId::new("b")).await;
        assert!(joined.is_ok());
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(engine.current_round().await >= 1);

        handle.abort();
    }
}
