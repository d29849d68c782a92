//! Pair sessions and their lifecycle state machine.
//!
//! [`PairId`] is a newtype wrapper around [`uuid::Uuid`] (v4). A
//! [`PairSession`] is created in `Proposed` when the matcher emits a pair
//! and walks the lifecycle `Proposed → Active → Completed/Expired`.
//! Transitions themselves are driven by the engine, which owns the
//! session table and the critical section.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::participant::ParticipantId;
use crate::error::EngineError;

/// Unique identifier for a pair session.
///
/// Wraps a UUID v4. Generated when the matcher emits the pair and
/// immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(uuid::Uuid);

impl PairId {
    /// Creates a new random `PairId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `PairId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for PairId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a pair session.
///
/// `Completed` and `Expired` are terminal. Only `Completed` sessions are
/// recorded in the history ledger; an `Expired` pairing may be retried in
/// a later round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created by the matcher; waiting for both acknowledgments.
    Proposed,
    /// Both participants acknowledged within the acceptance window.
    Active,
    /// Terminal: session finished successfully.
    Completed,
    /// Terminal: acceptance window elapsed, a participant left, or the
    /// session was otherwise abandoned.
    Expired,
}

impl SessionState {
    /// Returns `true` for the terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }
}

/// A two-person session produced by one matching round.
///
/// Invariants: the two participant identifiers are never equal, and a
/// participant belongs to at most one non-terminal session at a time
/// (enforced by the engine's session table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSession {
    /// Unique session identifier.
    pub pair_id: PairId,

    /// First participant (pool snapshot order).
    pub first: ParticipantId,

    /// Second participant.
    pub second: ParticipantId,

    /// Round in which the pair was formed (immutable).
    pub round: u64,

    /// Current lifecycle state.
    pub state: SessionState,

    /// Whether `first` has acknowledged the proposal.
    pub first_acked: bool,

    /// Whether `second` has acknowledged the proposal.
    pub second_acked: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PairSession {
    /// Creates a new `Proposed` session for the given participants.
    #[must_use]
    pub fn new(first: ParticipantId, second: ParticipantId, round: u64) -> Self {
        Self {
            pair_id: PairId::new(),
            first,
            second,
            round,
            state: SessionState::Proposed,
            first_acked: false,
            second_acked: false,
            created_at: Utc::now(),
        }
    }

    /// Returns both participant identifiers.
    #[must_use]
    pub fn participants(&self) -> [ParticipantId; 2] {
        [self.first.clone(), self.second.clone()]
    }

    /// Returns `true` if the given participant is a member of this pair.
    #[must_use]
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.first == *id || self.second == *id
    }

    /// Records an acknowledgment from `id`.
    ///
    /// Repeat acknowledgments from the same participant are idempotent.
    /// Returns `true` once both participants have acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownParticipant`] if `id` is not a member
    /// of this pair, or [`EngineError::InvalidTransition`] if the session
    /// is not `Proposed`.
    pub fn acknowledge(&mut self, id: &ParticipantId) -> Result<bool, EngineError> {
        if !self.contains(id) {
            return Err(EngineError::UnknownParticipant(id.clone()));
        }
        if self.state != SessionState::Proposed {
            return Err(EngineError::InvalidTransition {
                operation: "acknowledge",
                detail: format!("session {} is {:?}", self.pair_id, self.state),
            });
        }
        if *id == self.first {
            self.first_acked = true;
        } else {
            self.second_acked = true;
        }
        Ok(self.first_acked && self.second_acked)
    }
}
