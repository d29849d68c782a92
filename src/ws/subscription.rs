//! Per-connection subscription manager.
//!
//! Tracks which participant IDs a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::participant::ParticipantId;
use crate::domain::PairingEvent;

/// Manages the participant subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed participant IDs. Ignored when `subscribe_all` is set.
    participant_ids: HashSet<ParticipantId>,
    /// Whether the client subscribes to all events (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds participant IDs to the subscription set. `"*"` enables the wildcard.
    pub fn subscribe(&mut self, ids: &[ParticipantId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        for id in ids {
            self.participant_ids.insert(id.clone());
        }
    }

    /// Removes participant IDs from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[ParticipantId]) {
        for id in ids {
            self.participant_ids.remove(id);
        }
    }

    /// Returns `true` if the event matches the subscription filter.
    ///
    /// Session events match when either member is subscribed. Round
    /// summaries go to every connection holding at least one
    /// subscription, since the round outcome concerns the whole pool.
    #[must_use]
    pub fn matches(&self, event: &PairingEvent) -> bool {
        if self.subscribe_all {
            return true;
        }
        match event.participants() {
            Some(members) => members.iter().any(|id| self.participant_ids.contains(id)),
            None => !self.participant_ids.is_empty(),
        }
    }

    /// Returns the number of explicitly subscribed participant IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.participant_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::pair::PairId;
    use chrono::Utc;

    fn proposal_for(a: &str, b: &str) -> PairingEvent {
        PairingEvent::SessionProposed {
            pair_id: PairId::new(),
            participants: [ParticipantId::new(a), ParticipantId::new(b)],
            round: 1,
            timestamp: Utc::now(),
        }
    }

    fn round_summary() -> PairingEvent {
        PairingEvent::RoundCompleted {
            round: 1,
            pairs_formed: 1,
            unmatched: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&proposal_for("alice", "bob")));
        assert!(!mgr.matches(&round_summary()));
    }

    #[test]
    fn subscribe_specific_participant() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[ParticipantId::new("alice")], false);
        assert!(mgr.matches(&proposal_for("alice", "bob")));
        assert!(!mgr.matches(&proposal_for("carol", "dave")));
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.matches(&proposal_for("alice", "bob")));
        assert!(mgr.matches(&round_summary()));
    }

    #[test]
    fn round_summary_reaches_any_subscriber() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[ParticipantId::new("alice")], false);
        assert!(mgr.matches(&round_summary()));
    }

    #[test]
    fn unsubscribe_removes_participant() {
        let mut mgr = SubscriptionManager::new();
        let alice = ParticipantId::new("alice");
        mgr.subscribe(&[alice.clone()], false);
        assert!(mgr.matches(&proposal_for("alice", "bob")));
        mgr.unsubscribe(&[alice]);
        assert!(!mgr.matches(&proposal_for("alice", "bob")));
    }

    #[test]
    fn count_tracks_explicit() {
        let mut mgr = SubscriptionManager::new();
        assert_eq!(mgr.count(), 0);
        mgr.subscribe(
            &[ParticipantId::new("alice"), ParticipantId::new("bob")],
            false,
        );
        assert_eq!(mgr.count(), 2);
    }
}
