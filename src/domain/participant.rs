//! Participant identity and availability state.
//!
//! [`ParticipantId`] is a newtype wrapper around an opaque client-supplied
//! string, providing type safety so participant identifiers cannot be
//! confused with other strings. [`Participant`] tracks the availability
//! state used by the pool and the matching engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque unique identifier for a participant.
///
/// Supplied by the client on join and immutable thereafter. Used as the
/// dictionary key in [`super::ParticipantPool`], in history ledger keys,
/// and as the WebSocket subscription target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Creates a `ParticipantId` from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Availability state of a participant within the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantState {
    /// Tracked but not waiting for a match (e.g. after a session ended).
    Idle,
    /// Waiting in the queue for the next round.
    Queued,
    /// Currently a member of a live pair session.
    Paired,
}

/// A participant tracked by the pool.
///
/// Owned exclusively by [`super::ParticipantPool`]; created on join and
/// removed on explicit leave or idle eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Unique identifier (immutable after join).
    pub id: ParticipantId,

    /// Current availability state.
    pub state: ParticipantState,

    /// When the participant entered the queue. Re-stamped on each
    /// `Idle → Queued` transition; this is the queue ordering key.
    pub joined_at: DateTime<Utc>,

    /// Round counter value at the moment the participant became `Queued`.
    /// Used for starvation accounting.
    pub queued_at_round: u64,

    /// Timestamp of the last state transition. Drives idle eviction.
    pub last_transition_at: DateTime<Utc>,
}

impl Participant {
    /// Creates a new `Queued` participant joining at the given round.
    #[must_use]
    pub fn new(id: ParticipantId, round: u64) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: ParticipantState::Queued,
            joined_at: now,
            queued_at_round: round,
            last_transition_at: now,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn id_display_round_trip() {
        let id = ParticipantId::new("alice");
        assert_eq!(id.as_str(), "alice");
        assert_eq!(format!("{id}"), "alice");
    }

    #[test]
    fn id_ordering_is_lexical() {
        let a = ParticipantId::new("alice");
        let b = ParticipantId::new("bob");
        assert!(a < b);
    }

    #[test]
    fn serde_is_transparent() {
        let id = ParticipantId::new("carol");
        let json = serde_json::to_string(&id).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"carol\"");
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = ParticipantId::new("dave");
        let mut map = HashMap::new();
        map.insert(id.clone(), 1u32);
        assert_eq!(map.get(&id), Some(&1));
    }

    #[test]
    fn new_participant_is_queued() {
        let p = Participant::new(ParticipantId::new("erin"), 3);
        assert_eq!(p.state, ParticipantState::Queued);
        assert_eq!(p.queued_at_round, 3);
    }
}
