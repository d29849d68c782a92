//! Opaque structured snapshot of engine state for persistence collaborators.
//!
//! Only the minimal state needed to reconstruct pairing decisions after a
//! restart is captured: the round counter, the participant pool, and the
//! history ledger. In-flight sessions are deliberately excluded; their
//! timers cannot survive a restart, so restored `Paired` participants
//! come back as `Idle` and may re-join.

use serde::{Deserialize, Serialize};

use crate::domain::ledger::HistoryRecord;
use crate::domain::participant::Participant;

/// Serializable snapshot of the pairing engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Round counter at snapshot time.
    pub round: u64,

    /// Every tracked participant.
    pub participants: Vec<Participant>,

    /// All retained history ledger rows.
    pub history: Vec<HistoryRecord>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::participant::ParticipantId;

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = EngineSnapshot {
            round: 12,
            participants: vec![Participant::new(ParticipantId::new("a"), 11)],
            history: vec![HistoryRecord {
                first: ParticipantId::new("a"),
                second: ParticipantId::new("b"),
                round: 10,
            }],
        };

        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        let restored: Option<EngineSnapshot> = serde_json::from_str(&json).ok();
        let Some(restored) = restored else {
            panic!("snapshot failed to deserialize");
        };
        assert_eq!(restored.round, 12);
        assert_eq!(restored.participants.len(), 1);
        assert_eq!(restored.history.len(), 1);
    }
}
