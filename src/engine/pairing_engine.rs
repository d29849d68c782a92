//! Pairing engine: the single critical section over pool, ledger, and
//! sessions.
//!
//! [`PairingEngine`] serializes every mutating operation — joins, leaves,
//! round execution, acknowledgments, completions, and timer callbacks —
//! through one [`tokio::sync::Mutex`]. Round execution (snapshot → match
//! → mark paired → session creation) happens under a single acquisition,
//! so no join or leave can interleave mid-round. Every operation follows
//! the pattern: lock → validate → mutate → unlock → publish events.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use crate::config::EngineConfig;
use crate::domain::matcher;
use crate::domain::pair::{PairId, PairSession, SessionState};
use crate::domain::participant::{Participant, ParticipantId};
use crate::domain::{EventBus, HistoryLedger, PairingEvent, ParticipantPool};
use crate::error::EngineError;

use super::snapshot::EngineSnapshot;

/// Outcome of one round execution.
#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    /// The round that was executed.
    pub round: u64,
    /// Sessions proposed this round.
    pub pairs: Vec<PairSession>,
    /// Participants carried forward to the next round.
    pub unmatched: Vec<ParticipantId>,
}

/// Mutable engine state guarded by the critical section.
#[derive(Debug, Default)]
struct EngineCore {
    pool: ParticipantPool,
    ledger: HistoryLedger,
    /// Non-terminal sessions keyed by pair id.
    sessions: HashMap<PairId, PairSession>,
    /// Reverse index: participant → its one non-terminal session.
    member_index: HashMap<ParticipantId, PairId>,
    /// Pending acceptance/session timers, cancellable on early transition.
    timers: HashMap<PairId, AbortHandle>,
    /// Monotonically increasing round counter.
    round: u64,
}

/// The pairing engine and session lifecycle state machine.
///
/// Single authoritative instance per pool: all state lives behind one
/// mutex, and timer tasks re-acquire it before mutating anything.
#[derive(Debug)]
pub struct PairingEngine {
    core: Mutex<EngineCore>,
    event_bus: EventBus,
    config: EngineConfig,
}

impl PairingEngine {
    /// Creates an engine with the given configuration and event bus.
    #[must_use]
    pub fn new(config: EngineConfig, event_bus: EventBus) -> Self {
        Self {
            core: Mutex::new(EngineCore::default()),
            event_bus,
            config,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Adds a participant to the queue.
    ///
    /// Re-queues an `Idle` participant with a fresh join timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyQueued`] if the participant is
    /// tracked and not `Idle`.
    pub async fn join(&self, id: ParticipantId) -> Result<Participant, EngineError> {
        let mut core = self.core.lock().await;
        let round = core.round;
        let participant = core.pool.join(id, round)?.clone();
        tracing::info!(participant = %participant.id, "participant joined queue");
        Ok(participant)
    }

    /// Removes a participant, cascading any pending pair into `Expired`.
    ///
    /// Unknown ids are a no-op, not an error. Effective immediately: this
    /// is the sole cancellation primitive.
    pub async fn leave(&self, id: &ParticipantId) {
        let mut core = self.core.lock().await;
        let removed = core.pool.leave(id);

        let mut events = Vec::new();
        if let Some(pair_id) = core.member_index.get(id).copied() {
            if let Some(event) = expire_locked(&mut core, pair_id) {
                events.push(event);
            }
        }
        drop(core);

        if removed.is_some() {
            tracing::info!(participant = %id, "participant left");
        }
        for event in events {
            self.event_bus.publish(event);
        }
    }

    /// Executes one matching round.
    ///
    /// Atomic with respect to pool mutations: the snapshot, the matching
    /// computation, and the `Paired` transitions all happen under one
    /// lock acquisition. `lookback_override` replaces the configured
    /// lookback for this round only; since the ledger is pruned to the
    /// configured window, an override is only useful for loosening.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StarvationDetected`] — before any state is
    /// touched — when a participant has been queued beyond the configured
    /// round threshold and no `lookback_override` was supplied. The
    /// caller retries with a loosened lookback.
    pub async fn run_round(
        self: &Arc<Self>,
        lookback_override: Option<u64>,
    ) -> Result<RoundReport, EngineError> {
        let mut core = self.core.lock().await;

        // Starvation check runs before any mutation so a failed round
        // leaves pool and ledger untouched.
        if lookback_override.is_none() {
            let threshold = self.config.starvation_threshold_rounds;
            let current = core.round;
            let starving: Vec<ParticipantId> = core
                .pool
                .snapshot()
                .into_iter()
                .filter(|id| {
                    core.pool
                        .get(id)
                        .is_some_and(|p| current.saturating_sub(p.queued_at_round) >= threshold)
                })
                .collect();
            if !starving.is_empty() {
                return Err(EngineError::StarvationDetected {
                    starving,
                    round: current,
                });
            }
        }

        let evicted = core
            .pool
            .evict_idle(Utc::now(), self.config.idle_timeout());
        if !evicted.is_empty() {
            tracing::debug!(count = evicted.len(), "evicted idle participants");
        }

        let lookback = lookback_override.unwrap_or(self.config.lookback_rounds);
        let round = core.round.saturating_add(1);
        let snapshot = core.pool.snapshot();
        let outcome = matcher::compute(
            &snapshot,
            &core.ledger,
            round,
            lookback,
            self.config.search_threshold,
        );

        let mut events = Vec::with_capacity(outcome.pairs.len() + 1);
        let mut proposed = Vec::with_capacity(outcome.pairs.len());
        for (first, second) in outcome.pairs {
            core.pool.mark_paired(&[first.clone(), second.clone()])?;
            let session = PairSession::new(first, second, round);
            let pair_id = session.pair_id;
            core.member_index.insert(session.first.clone(), pair_id);
            core.member_index.insert(session.second.clone(), pair_id);

            events.push(PairingEvent::SessionProposed {
                pair_id,
                participants: session.participants(),
                round,
                timestamp: Utc::now(),
            });
            proposed.push(session.clone());
            core.sessions.insert(pair_id, session);

            self.arm_timer(&mut core, pair_id, TimerKind::Acceptance);
        }

        if self.config.lookback_rounds > 0 {
            core.ledger
                .prune(round.saturating_sub(self.config.lookback_rounds));
        }
        core.round = round;

        let report = RoundReport {
            round,
            pairs: proposed,
            unmatched: outcome.unmatched,
        };
        events.push(PairingEvent::RoundCompleted {
            round,
            pairs_formed: report.pairs.len(),
            unmatched: report.unmatched.clone(),
            timestamp: Utc::now(),
        });
        drop(core);

        tracing::info!(
            round = report.round,
            pairs = report.pairs.len(),
            unmatched = report.unmatched.len(),
            "round executed"
        );
        for event in events {
            self.event_bus.publish(event);
        }
        Ok(report)
    }

    /// Records an acknowledgment for a proposed session.
    ///
    /// The session transitions to `Active` only once both participants
    /// have acknowledged within the acceptance window; a one-sided
    /// acknowledgment is recorded and the call succeeds without a
    /// transition.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownPair`] for a nonexistent session,
    /// [`EngineError::UnknownParticipant`] when the participant is not a
    /// member, or [`EngineError::InvalidTransition`] when the session is
    /// no longer `Proposed`.
    pub async fn acknowledge(
        self: &Arc<Self>,
        pair_id: PairId,
        participant: &ParticipantId,
    ) -> Result<PairSession, EngineError> {
        let mut core = self.core.lock().await;
        let session = core
            .sessions
            .get_mut(&pair_id)
            .ok_or(EngineError::UnknownPair(*pair_id.as_uuid()))?;

        let both_acked = session.acknowledge(participant)?;
        let mut event = None;
        if both_acked {
            session.state = SessionState::Active;
            event = Some(PairingEvent::SessionActivated {
                pair_id,
                participants: session.participants(),
                round: session.round,
                timestamp: Utc::now(),
            });
        }
        let snapshot = session.clone();

        if both_acked {
            disarm_timer(&mut core, pair_id);
            self.arm_timer(&mut core, pair_id, TimerKind::Session);
        }
        drop(core);

        if let Some(event) = event {
            tracing::info!(%pair_id, "session activated");
            self.event_bus.publish(event);
        }
        Ok(snapshot)
    }

    /// Completes an active session.
    ///
    /// Records the pairing in the history ledger, returns both
    /// participants to `Idle`, and emits a `SessionCompleted` event.
    /// Triggered by either participant or by the session-duration timer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownPair`] for a nonexistent session or
    /// [`EngineError::InvalidTransition`] when the session is not
    /// `Active`.
    pub async fn complete(&self, pair_id: PairId) -> Result<PairSession, EngineError> {
        let mut core = self.core.lock().await;
        let session = core
            .sessions
            .get(&pair_id)
            .ok_or(EngineError::UnknownPair(*pair_id.as_uuid()))?;
        if session.state != SessionState::Active {
            return Err(EngineError::InvalidTransition {
                operation: "complete",
                detail: format!("session {pair_id} is {:?}", session.state),
            });
        }

        let mut finished = session.clone();
        finished.state = SessionState::Completed;

        core.ledger
            .record(&finished.first, &finished.second, finished.round);
        let members = finished.participants();
        core.pool.mark_idle(&members)?;
        remove_session(&mut core, pair_id);

        let event = PairingEvent::SessionCompleted {
            pair_id,
            participants: members,
            final_state: SessionState::Completed,
            round: finished.round,
            timestamp: Utc::now(),
        };
        drop(core);

        tracing::info!(%pair_id, "session completed");
        self.event_bus.publish(event);
        Ok(finished)
    }

    /// Timer callback: expires a session still `Proposed` after the
    /// acceptance window. No-op if the session already moved on.
    async fn expire_acceptance(&self, pair_id: PairId) {
        let mut core = self.core.lock().await;
        let still_proposed = core
            .sessions
            .get(&pair_id)
            .is_some_and(|s| s.state == SessionState::Proposed);
        let event = if still_proposed {
            expire_locked(&mut core, pair_id)
        } else {
            None
        };
        drop(core);

        if let Some(event) = event {
            tracing::info!(%pair_id, "acceptance window elapsed");
            self.event_bus.publish(event);
        }
    }

    /// Timer callback: completes a session still `Active` when the
    /// configured session duration is reached.
    async fn complete_on_timer(&self, pair_id: PairId) {
        match self.complete(pair_id).await {
            Ok(_) => tracing::info!(%pair_id, "session completed by timer"),
            // The session finished or expired before the timer fired.
            Err(_) => tracing::debug!(%pair_id, "session timer found nothing to complete"),
        }
    }

    /// Looks up a participant.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownParticipant`] if the id is not tracked.
    pub async fn participant(&self, id: &ParticipantId) -> Result<Participant, EngineError> {
        let core = self.core.lock().await;
        core.pool
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownParticipant(id.clone()))
    }

    /// Returns every tracked participant, queued first in snapshot order.
    pub async fn participants(&self) -> Vec<Participant> {
        let core = self.core.lock().await;
        let mut all: Vec<Participant> = core.pool.all().into_iter().cloned().collect();
        all.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Looks up a non-terminal session.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownPair`] if no live session has the id
    /// (terminal sessions are dropped once their lifecycle event is out).
    pub async fn session(&self, pair_id: PairId) -> Result<PairSession, EngineError> {
        let core = self.core.lock().await;
        core.sessions
            .get(&pair_id)
            .cloned()
            .ok_or(EngineError::UnknownPair(*pair_id.as_uuid()))
    }

    /// Returns all non-terminal sessions ordered by creation time.
    pub async fn sessions(&self) -> Vec<PairSession> {
        let core = self.core.lock().await;
        let mut all: Vec<PairSession> = core.sessions.values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.pair_id.as_uuid().cmp(b.pair_id.as_uuid()))
        });
        all
    }

    /// Returns the number of `Queued` participants.
    pub async fn queued_count(&self) -> usize {
        self.core.lock().await.pool.queued_count()
    }

    /// Returns the current round counter.
    pub async fn current_round(&self) -> u64 {
        self.core.lock().await.round
    }

    /// Captures an opaque structured snapshot for persistence collaborators.
    pub async fn snapshot(&self) -> EngineSnapshot {
        let core = self.core.lock().await;
        EngineSnapshot {
            round: core.round,
            participants: core.pool.all().into_iter().cloned().collect(),
            history: core.ledger.export(),
        }
    }

    /// Restores engine state from a snapshot taken by [`Self::snapshot`].
    ///
    /// Sessions are not restored; participants stored as `Paired` come
    /// back `Idle` so they can re-join.
    pub async fn restore(&self, snapshot: EngineSnapshot) {
        use crate::domain::participant::ParticipantState;

        let mut core = self.core.lock().await;
        let participants = snapshot
            .participants
            .into_iter()
            .map(|mut p| {
                if p.state == ParticipantState::Paired {
                    p.state = ParticipantState::Idle;
                }
                p
            })
            .collect();
        core.pool.restore(participants);
        core.ledger.restore(snapshot.history);
        core.round = snapshot.round;
        tracing::info!(round = core.round, "engine state restored from snapshot");
    }

    /// Spawns the acceptance or session timer for a pair and records its
    /// abort handle so early transitions can cancel it.
    fn arm_timer(self: &Arc<Self>, core: &mut EngineCore, pair_id: PairId, kind: TimerKind) {
        let engine = Arc::clone(self);
        let duration = match kind {
            TimerKind::Acceptance => self.config.acceptance_window(),
            TimerKind::Session => self.config.session_duration(),
        };
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            match kind {
                TimerKind::Acceptance => engine.expire_acceptance(pair_id).await,
                TimerKind::Session => engine.complete_on_timer(pair_id).await,
            }
        });
        core.timers.insert(pair_id, handle.abort_handle());
    }
}

/// Which per-pair timeout a spawned timer enforces.
#[derive(Debug, Clone, Copy)]
enum TimerKind {
    Acceptance,
    Session,
}

/// Expires a session under the lock: marks surviving members `Idle`,
/// drops the session and its timer, and returns the event to publish.
/// No history record is written, so the pairing may be retried later.
fn expire_locked(core: &mut EngineCore, pair_id: PairId) -> Option<PairingEvent> {
    let session = core.sessions.get(&pair_id)?;
    if session.state.is_terminal() {
        return None;
    }
    let members = session.participants();
    let round = session.round;

    // A leaving participant is already gone from the pool; only idle
    // the ones still present.
    let surviving: Vec<ParticipantId> = members
        .iter()
        .filter(|id| core.pool.get(id).is_some())
        .cloned()
        .collect();
    if core.pool.mark_idle(&surviving).is_err() {
        tracing::error!(%pair_id, "pair member in unexpected state during expiry");
    }
    remove_session(core, pair_id);

    Some(PairingEvent::SessionExpired {
        pair_id,
        participants: members,
        final_state: SessionState::Expired,
        round,
        timestamp: Utc::now(),
    })
}

/// Drops a session, its member index entries, and its pending timer.
fn remove_session(core: &mut EngineCore, pair_id: PairId) {
    if let Some(session) = core.sessions.remove(&pair_id) {
        core.member_index.remove(&session.first);
        core.member_index.remove(&session.second);
    }
    disarm_timer(core, pair_id);
}

fn disarm_timer(core: &mut EngineCore, pair_id: PairId) {
    if let Some(handle) = core.timers.remove(&pair_id) {
        handle.abort();
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::participant::ParticipantState;

    fn engine_with(config: EngineConfig) -> Arc<PairingEngine> {
        Arc::new(PairingEngine::new(config, EventBus::new(64)))
    }

    fn engine() -> Arc<PairingEngine> {
        engine_with(EngineConfig::default())
    }

    fn id(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    async fn join_all(engine: &Arc<PairingEngine>, names: &[&str]) {
        for name in names {
            let result = engine.join(id(name)).await;
            assert!(result.is_ok(), "join {name} failed");
        }
    }

    fn only_pair(report: &RoundReport) -> PairSession {
        assert_eq!(report.pairs.len(), 1);
        let Some(session) = report.pairs.first() else {
            panic!("no pair in report");
        };
        session.clone()
    }

    /// Drives a proposed session through acknowledge + complete.
    async fn finish_session(engine: &Arc<PairingEngine>, session: &PairSession) {
        let ack1 = engine.acknowledge(session.pair_id, &session.first).await;
        assert!(ack1.is_ok());
        let ack2 = engine.acknowledge(session.pair_id, &session.second).await;
        assert!(ack2.is_ok());
        let done = engine.complete(session.pair_id).await;
        assert!(done.is_ok());
    }

    #[tokio::test]
    async fn four_participants_form_two_pairs_in_join_order() {
        let engine = engine();
        join_all(&engine, &["a", "b", "c", "d"]).await;

        let Ok(report) = engine.run_round(None).await else {
            panic!("round failed");
        };
        assert_eq!(report.round, 1);
        assert_eq!(report.pairs.len(), 2);
        assert!(report.unmatched.is_empty());

        let members: Vec<[ParticipantId; 2]> =
            report.pairs.iter().map(PairSession::participants).collect();
        assert_eq!(members, vec![[id("a"), id("b")], [id("c"), id("d")]]);

        for name in ["a", "b", "c", "d"] {
            let Ok(p) = engine.participant(&id(name)).await else {
                panic!("{name} missing");
            };
            assert_eq!(p.state, ParticipantState::Paired);
        }
    }

    #[tokio::test]
    async fn odd_pool_leftover_stays_queued() {
        let engine = engine();
        join_all(&engine, &["a", "b", "c"]).await;

        let Ok(report) = engine.run_round(None).await else {
            panic!("round failed");
        };
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.unmatched, vec![id("c")]);

        let Ok(c) = engine.participant(&id("c")).await else {
            panic!("c missing");
        };
        assert_eq!(c.state, ParticipantState::Queued);
    }

    #[tokio::test]
    async fn empty_and_singleton_pools_are_noop_rounds() {
        let engine = engine();
        let Ok(report) = engine.run_round(None).await else {
            panic!("round failed");
        };
        assert!(report.pairs.is_empty());

        join_all(&engine, &["solo"]).await;
        let Ok(report) = engine.run_round(None).await else {
            panic!("round failed");
        };
        assert!(report.pairs.is_empty());
        assert_eq!(report.unmatched, vec![id("solo")]);
    }

    #[tokio::test]
    async fn double_join_is_rejected_without_state_change() {
        let engine = engine();
        join_all(&engine, &["a"]).await;

        let second = engine.join(id("a")).await;
        assert!(matches!(second, Err(EngineError::AlreadyQueued(_))));
        assert_eq!(engine.queued_count().await, 1);
    }

    #[tokio::test]
    async fn repeat_pair_blocked_until_lookback_loosened() {
        let engine = engine();
        join_all(&engine, &["a", "b"]).await;

        let Ok(report) = engine.run_round(None).await else {
            panic!("round 1 failed");
        };
        let session = only_pair(&report);
        finish_session(&engine, &session).await;

        // Both are Idle after completion; re-queue them.
        join_all(&engine, &["a", "b"]).await;

        // The completed pairing is inside the lookback window.
        let Ok(report) = engine.run_round(None).await else {
            panic!("round 2 failed");
        };
        assert!(report.pairs.is_empty());
        assert_eq!(report.unmatched, vec![id("a"), id("b")]);

        // Loosening the lookback to zero admits the repeat.
        let Ok(report) = engine.run_round(Some(0)).await else {
            panic!("round 3 failed");
        };
        let session = only_pair(&report);
        assert_eq!(session.participants(), [id("a"), id("b")]);
    }

    #[tokio::test(start_paused = true)]
    async fn one_sided_ack_expires_without_history() {
        let config = EngineConfig {
            acceptance_window_secs: 5,
            ..EngineConfig::default()
        };
        let engine = engine_with(config);
        let mut events = engine.event_bus().subscribe();

        join_all(&engine, &["a", "b"]).await;
        let Ok(report) = engine.run_round(None).await else {
            panic!("round failed");
        };
        let session = only_pair(&report);

        let ack = engine.acknowledge(session.pair_id, &id("a")).await;
        assert!(ack.is_ok());

        // Let the acceptance window elapse; only one side acknowledged.
        tokio::time::sleep(std::time::Duration::from_secs(6)).await;

        assert!(matches!(
            engine.session(session.pair_id).await,
            Err(EngineError::UnknownPair(_))
        ));
        for name in ["a", "b"] {
            let Ok(p) = engine.participant(&id(name)).await else {
                panic!("{name} missing");
            };
            assert_eq!(p.state, ParticipantState::Idle);
        }

        let mut saw_expired = false;
        while let Ok(event) = events.try_recv() {
            if event.event_type_str() == "session_expired" {
                saw_expired = true;
            }
            assert_ne!(event.event_type_str(), "session_completed");
        }
        assert!(saw_expired);

        // No history record: the same pair forms again immediately.
        join_all(&engine, &["a", "b"]).await;
        let Ok(report) = engine.run_round(None).await else {
            panic!("retry round failed");
        };
        assert_eq!(only_pair(&report).participants(), [id("a"), id("b")]);
    }

    #[tokio::test(start_paused = true)]
    async fn session_timer_completes_active_session() {
        let config = EngineConfig {
            acceptance_window_secs: 30,
            session_duration_secs: 10,
            ..EngineConfig::default()
        };
        let engine = engine_with(config);
        let mut events = engine.event_bus().subscribe();

        join_all(&engine, &["a", "b"]).await;
        let Ok(report) = engine.run_round(None).await else {
            panic!("round failed");
        };
        let session = only_pair(&report);

        let _ = engine.acknowledge(session.pair_id, &id("a")).await;
        let Ok(active) = engine.acknowledge(session.pair_id, &id("b")).await else {
            panic!("second ack failed");
        };
        assert_eq!(active.state, SessionState::Active);

        tokio::time::sleep(std::time::Duration::from_secs(11)).await;

        // Timer completed the session: participants idle, history written.
        for name in ["a", "b"] {
            let Ok(p) = engine.participant(&id(name)).await else {
                panic!("{name} missing");
            };
            assert_eq!(p.state, ParticipantState::Idle);
        }
        let mut saw_completed = false;
        while let Ok(event) = events.try_recv() {
            if event.event_type_str() == "session_completed" {
                saw_completed = true;
            }
        }
        assert!(saw_completed);

        join_all(&engine, &["a", "b"]).await;
        let Ok(report) = engine.run_round(None).await else {
            panic!("blocked round failed");
        };
        assert!(report.pairs.is_empty(), "repeat pair must be blocked");
    }

    #[tokio::test]
    async fn leave_cascades_into_expiry() {
        let engine = engine();
        let mut events = engine.event_bus().subscribe();

        join_all(&engine, &["a", "b"]).await;
        let Ok(report) = engine.run_round(None).await else {
            panic!("round failed");
        };
        let session = only_pair(&report);

        engine.leave(&id("a")).await;

        assert!(matches!(
            engine.session(session.pair_id).await,
            Err(EngineError::UnknownPair(_))
        ));
        assert!(matches!(
            engine.participant(&id("a")).await,
            Err(EngineError::UnknownParticipant(_))
        ));
        let Ok(b) = engine.participant(&id("b")).await else {
            panic!("b missing");
        };
        assert_eq!(b.state, ParticipantState::Idle);

        let mut saw_expired = false;
        while let Ok(event) = events.try_recv() {
            if event.event_type_str() == "session_expired" {
                saw_expired = true;
            }
        }
        assert!(saw_expired);
    }

    #[tokio::test]
    async fn leave_unknown_participant_is_noop() {
        let engine = engine();
        engine.leave(&id("ghost")).await;
        assert_eq!(engine.queued_count().await, 0);
    }

    #[tokio::test]
    async fn complete_requires_active_session() {
        let engine = engine();
        join_all(&engine, &["a", "b"]).await;
        let Ok(report) = engine.run_round(None).await else {
            panic!("round failed");
        };
        let session = only_pair(&report);

        let result = engine.complete(session.pair_id).await;
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));
        // The failed call must not have disturbed the session.
        let Ok(still) = engine.session(session.pair_id).await else {
            panic!("session disappeared");
        };
        assert_eq!(still.state, SessionState::Proposed);
    }

    #[tokio::test]
    async fn acknowledge_unknown_pair_is_rejected() {
        let engine = engine();
        let result = engine.acknowledge(PairId::new(), &id("a")).await;
        assert!(matches!(result, Err(EngineError::UnknownPair(_))));
    }

    #[tokio::test]
    async fn starvation_surfaced_then_resolved_by_override() {
        let config = EngineConfig {
            starvation_threshold_rounds: 1,
            ..EngineConfig::default()
        };
        let engine = engine_with(config);

        join_all(&engine, &["a", "b"]).await;
        let Ok(report) = engine.run_round(None).await else {
            panic!("round 1 failed");
        };
        finish_session(&engine, &only_pair(&report)).await;
        join_all(&engine, &["a", "b"]).await;

        // Round 2: both queued, repeat blocked, nobody starving yet.
        let Ok(report) = engine.run_round(None).await else {
            panic!("round 2 failed");
        };
        assert!(report.pairs.is_empty());

        // Round 3: both sat through a full round unmatched — surfaced,
        // and the failed call leaves the round counter untouched.
        let result = engine.run_round(None).await;
        let Err(EngineError::StarvationDetected { starving, round }) = result else {
            panic!("expected starvation error");
        };
        assert_eq!(round, 2);
        assert_eq!(starving.len(), 2);
        assert_eq!(engine.current_round().await, 2);

        // The caller loosens the lookback and retries.
        let Ok(report) = engine.run_round(Some(0)).await else {
            panic!("override round failed");
        };
        assert_eq!(report.pairs.len(), 1);
    }

    #[tokio::test]
    async fn starving_round_defers_idle_eviction() {
        let engine = engine();
        let now = Utc::now();

        // Round 5 with two participants queued since round 0 (starving
        // under the default threshold) and one idle participant stale
        // enough to be evicted.
        let mut participants = vec![Participant {
            id: id("old"),
            state: ParticipantState::Idle,
            joined_at: now - chrono::Duration::hours(3),
            queued_at_round: 0,
            last_transition_at: now - chrono::Duration::hours(2),
        }];
        for name in ["a", "b"] {
            participants.push(Participant {
                id: id(name),
                state: ParticipantState::Queued,
                joined_at: now,
                queued_at_round: 0,
                last_transition_at: now,
            });
        }
        engine
            .restore(EngineSnapshot {
                round: 5,
                participants,
                history: Vec::new(),
            })
            .await;

        // The starving round must fail without touching the pool, so
        // the stale idle participant survives it.
        let result = engine.run_round(None).await;
        assert!(matches!(result, Err(EngineError::StarvationDetected { .. })));
        assert!(engine.participant(&id("old")).await.is_ok());

        // A successful round evicts as usual.
        let Ok(report) = engine.run_round(Some(0)).await else {
            panic!("override round failed");
        };
        assert_eq!(report.pairs.len(), 1);
        assert!(matches!(
            engine.participant(&id("old")).await,
            Err(EngineError::UnknownParticipant(_))
        ));
    }

    #[tokio::test]
    async fn identical_histories_give_identical_rounds() {
        let mut reports = Vec::new();
        for _ in 0..2 {
            let engine = engine();
            join_all(&engine, &["a", "b", "c", "d", "e"]).await;
            let Ok(report) = engine.run_round(None).await else {
                panic!("round failed");
            };
            reports.push((
                report
                    .pairs
                    .iter()
                    .map(PairSession::participants)
                    .collect::<Vec<_>>(),
                report.unmatched,
            ));
        }
        assert_eq!(reports.first(), reports.last());
    }

    #[tokio::test]
    async fn snapshot_restore_preserves_round_pool_and_history() {
        let source = engine();
        join_all(&source, &["a", "b", "c"]).await;
        let Ok(report) = source.run_round(None).await else {
            panic!("round failed");
        };
        finish_session(&source, &only_pair(&report)).await;

        let snapshot = source.snapshot().await;

        let restored = engine();
        restored.restore(snapshot).await;
        assert_eq!(restored.current_round().await, 1);
        // c was still queued; a and b idle after completion.
        assert_eq!(restored.queued_count().await, 1);

        // History survived: a re-queued a/b pair is still blocked.
        join_all(&restored, &["a", "b"]).await;
        let Ok(report) = restored.run_round(None).await else {
            panic!("restored round failed");
        };
        let members: Vec<[ParticipantId; 2]> =
            report.pairs.iter().map(PairSession::participants).collect();
        assert!(!members.contains(&[id("a"), id("b")]));
    }

    #[tokio::test]
    async fn round_emits_proposed_and_round_events() {
        let engine = engine();
        let mut events = engine.event_bus().subscribe();

        join_all(&engine, &["a", "b"]).await;
        let Ok(_) = engine.run_round(None).await else {
            panic!("round failed");
        };

        let mut types = Vec::new();
        while let Ok(event) = events.try_recv() {
            types.push(event.event_type_str());
        }
        assert_eq!(types, vec!["session_proposed", "round_completed"]);
    }
}
