//! Domain events reflecting pairing state transitions.
//!
//! Every session lifecycle transition and every completed round emits a
//! [`PairingEvent`] through the [`super::EventBus`]. Events are broadcast
//! to WebSocket subscribers (the presentation layer) and optionally
//! persisted to the PostgreSQL event log.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::pair::{PairId, SessionState};
use super::participant::ParticipantId;

/// Domain event emitted after a state transition or round.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PairingEvent {
    /// Emitted when the matcher forms a pair and proposes a session.
    SessionProposed {
        /// Session identifier.
        pair_id: PairId,
        /// Both members of the pair.
        participants: [ParticipantId; 2],
        /// Round in which the pair was formed.
        round: u64,
        /// Proposal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when both participants acknowledge within the window.
    SessionActivated {
        /// Session identifier.
        pair_id: PairId,
        /// Both members of the pair.
        participants: [ParticipantId; 2],
        /// Round in which the pair was formed.
        round: u64,
        /// Activation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a session reaches `Completed`.
    SessionCompleted {
        /// Session identifier.
        pair_id: PairId,
        /// Both members of the pair.
        participants: [ParticipantId; 2],
        /// Terminal state (always `Completed`).
        final_state: SessionState,
        /// Round in which the pair was formed.
        round: u64,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a session reaches `Expired` (window elapsed, a
    /// participant left, or the proposal was abandoned).
    SessionExpired {
        /// Session identifier.
        pair_id: PairId,
        /// Both members of the pair.
        participants: [ParticipantId; 2],
        /// Terminal state (always `Expired`).
        final_state: SessionState,
        /// Round in which the pair was formed.
        round: u64,
        /// Expiry timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after each round execution for observability collaborators.
    RoundCompleted {
        /// The round that just ran.
        round: u64,
        /// Number of pairs formed.
        pairs_formed: usize,
        /// Participants carried forward to the next round (odd-pool
        /// leftover and history-blocked participants).
        unmatched: Vec<ParticipantId>,
        /// Round timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl PairingEvent {
    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::SessionProposed { .. } => "session_proposed",
            Self::SessionActivated { .. } => "session_activated",
            Self::SessionCompleted { .. } => "session_completed",
            Self::SessionExpired { .. } => "session_expired",
            Self::RoundCompleted { .. } => "round_completed",
        }
    }

    /// Returns the participants a session event concerns, or `None` for
    /// round events (those are global).
    #[must_use]
    pub fn participants(&self) -> Option<&[ParticipantId; 2]> {
        match self {
            Self::SessionProposed { participants, .. }
            | Self::SessionActivated { participants, .. }
            | Self::SessionCompleted { participants, .. }
            | Self::SessionExpired { participants, .. } => Some(participants),
            Self::RoundCompleted { .. } => None,
        }
    }

    /// Returns the session id for session events, `None` for round events.
    #[must_use]
    pub const fn pair_id(&self) -> Option<PairId> {
        match self {
            Self::SessionProposed { pair_id, .. }
            | Self::SessionActivated { pair_id, .. }
            | Self::SessionCompleted { pair_id, .. }
            | Self::SessionExpired { pair_id, .. } => Some(*pair_id),
            Self::RoundCompleted { .. } => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn members() -> [ParticipantId; 2] {
        [ParticipantId::new("a"), ParticipantId::new("b")]
    }

    #[test]
    fn event_type_strings() {
        let event = PairingEvent::SessionExpired {
            pair_id: PairId::new(),
            participants: members(),
            final_state: SessionState::Expired,
            round: 1,
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "session_expired");
    }

    #[test]
    fn round_event_has_no_participants() {
        let event = PairingEvent::RoundCompleted {
            round: 2,
            pairs_formed: 3,
            unmatched: vec![ParticipantId::new("c")],
            timestamp: Utc::now(),
        };
        assert!(event.participants().is_none());
        assert!(event.pair_id().is_none());
    }

    #[test]
    fn completed_event_serializes_with_tag() {
        let event = PairingEvent::SessionCompleted {
            pair_id: PairId::new(),
            participants: members(),
            final_state: SessionState::Completed,
            round: 4,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("session_completed"));
        assert!(json.contains("\"round\":4"));
    }
}
