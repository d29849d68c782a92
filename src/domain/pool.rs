//! Participant pool: the sole authority on matching eligibility.
//!
//! [`ParticipantPool`] tracks every known participant and its
//! availability state. It is a plain data structure with no interior
//! locking; the engine serializes all access through its critical
//! section, so the pool itself only validates state transitions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::participant::{Participant, ParticipantId, ParticipantState};
use crate::error::EngineError;

/// In-memory store of all tracked participants.
#[derive(Debug, Default)]
pub struct ParticipantPool {
    participants: HashMap<ParticipantId, Participant>,
}

impl ParticipantPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a participant to the queue at the given round.
    ///
    /// An unknown participant is created directly in `Queued`. A
    /// participant already tracked in `Idle` is re-queued with a fresh
    /// join timestamp (never an error).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyQueued`] if the participant is
    /// tracked and not `Idle`.
    pub fn join(&mut self, id: ParticipantId, round: u64) -> Result<&Participant, EngineError> {
        if let Some(existing) = self.participants.get(&id) {
            if existing.state != ParticipantState::Idle {
                return Err(EngineError::AlreadyQueued(id));
            }
        }
        let participant = Participant::new(id.clone(), round);
        self.participants.insert(id.clone(), participant);
        self.participants
            .get(&id)
            .ok_or_else(|| EngineError::Internal("participant vanished after insert".to_string()))
    }

    /// Removes a participant regardless of state.
    ///
    /// Returns the removed participant, or `None` if the id was unknown
    /// (a no-op, not an error). Cascading a pending pair into `Expired`
    /// is the engine's responsibility.
    pub fn leave(&mut self, id: &ParticipantId) -> Option<Participant> {
        self.participants.remove(id)
    }

    /// Returns the `Queued` participant ids ordered by join timestamp,
    /// tie-broken by lexical id order.
    ///
    /// This ordering is the sole source of determinism for matching.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ParticipantId> {
        let mut queued: Vec<&Participant> = self
            .participants
            .values()
            .filter(|p| p.state == ParticipantState::Queued)
            .collect();
        queued.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        queued.into_iter().map(|p| p.id.clone()).collect()
    }

    /// Transitions the given participants from `Queued` to `Paired`.
    ///
    /// Validated before mutation: if any id is unknown or not `Queued`,
    /// no participant is modified.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownParticipant`] or
    /// [`EngineError::InvalidTransition`] on the first offending id.
    pub fn mark_paired(&mut self, ids: &[ParticipantId]) -> Result<(), EngineError> {
        self.transition_all(ids, ParticipantState::Queued, ParticipantState::Paired)
    }

    /// Transitions the given participants from `Paired` back to `Idle`.
    ///
    /// Validated before mutation, like [`Self::mark_paired`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownParticipant`] or
    /// [`EngineError::InvalidTransition`] on the first offending id.
    pub fn mark_idle(&mut self, ids: &[ParticipantId]) -> Result<(), EngineError> {
        self.transition_all(ids, ParticipantState::Paired, ParticipantState::Idle)
    }

    fn transition_all(
        &mut self,
        ids: &[ParticipantId],
        from: ParticipantState,
        to: ParticipantState,
    ) -> Result<(), EngineError> {
        // Check-then-act: validate every id before touching any state.
        for id in ids {
            let participant = self
                .participants
                .get(id)
                .ok_or_else(|| EngineError::UnknownParticipant(id.clone()))?;
            if participant.state != from {
                return Err(EngineError::InvalidTransition {
                    operation: "mark_state",
                    detail: format!("participant {id} is {:?}, expected {from:?}", participant.state),
                });
            }
        }
        let now = Utc::now();
        for id in ids {
            if let Some(participant) = self.participants.get_mut(id) {
                participant.state = to;
                participant.last_transition_at = now;
            }
        }
        Ok(())
    }

    /// Evicts `Idle` participants whose last transition is older than
    /// `timeout`. Returns the evicted ids.
    pub fn evict_idle(&mut self, now: DateTime<Utc>, timeout: chrono::Duration) -> Vec<ParticipantId> {
        let expired: Vec<ParticipantId> = self
            .participants
            .values()
            .filter(|p| p.state == ParticipantState::Idle && now - p.last_transition_at > timeout)
            .map(|p| p.id.clone())
            .collect();
        for id in &expired {
            self.participants.remove(id);
        }
        expired
    }

    /// Looks up a participant by id.
    #[must_use]
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Returns all tracked participants (unordered).
    #[must_use]
    pub fn all(&self) -> Vec<&Participant> {
        self.participants.values().collect()
    }

    /// Returns the number of `Queued` participants.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.participants
            .values()
            .filter(|p| p.state == ParticipantState::Queued)
            .count()
    }

    /// Returns the number of tracked participants in any state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Returns `true` if the pool tracks no participants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Replaces the pool contents from a restored snapshot.
    pub fn restore(&mut self, participants: Vec<Participant>) {
        self.participants = participants.into_iter().map(|p| (p.id.clone(), p)).collect();
    }
}
