//! History ledger enforcing the no-repeat constraint.
//!
//! [`HistoryLedger`] maps each unordered participant pair to the most
//! recent round in which the two completed a session together. Only the
//! latest round per pair matters for the lookback check, so `record`
//! overwrites and `prune` bounds memory to the lookback window.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::participant::ParticipantId;

/// Unordered pair of participant identifiers.
///
/// The constructor normalizes the order so that `{a, b}` and `{b, a}`
/// produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey(ParticipantId, ParticipantId);

impl PairKey {
    /// Builds a normalized key for the unordered pair `{a, b}`.
    #[must_use]
    pub fn new(a: &ParticipantId, b: &ParticipantId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }
}

/// A completed pairing, as stored in snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// First participant (normalized order).
    pub first: ParticipantId,
    /// Second participant (normalized order).
    pub second: ParticipantId,
    /// Most recent round in which the pair completed a session.
    pub round: u64,
}

/// Ledger of completed pairings keyed by unordered pair.
#[derive(Debug, Default)]
pub struct HistoryLedger {
    records: HashMap<PairKey, u64>,
}

impl HistoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `{a, b}` completed a session within `lookback`
    /// rounds of `round` (the round currently being formed).
    ///
    /// A recorded round `r` blocks the pair iff `round - r <= lookback`;
    /// `lookback == 0` therefore disables the constraint entirely.
    #[must_use]
    pub fn has_paired(&self, a: &ParticipantId, b: &ParticipantId, round: u64, lookback: u64) -> bool {
        if lookback == 0 {
            return false;
        }
        self.records
            .get(&PairKey::new(a, b))
            .is_some_and(|&recorded| round.saturating_sub(recorded) <= lookback)
    }

    /// Records that `{a, b}` completed a session in `round`, overwriting
    /// any older entry for the same unordered pair.
    pub fn record(&mut self, a: &ParticipantId, b: &ParticipantId, round: u64) {
        self.records.insert(PairKey::new(a, b), round);
    }

    /// Removes records from rounds strictly before `before_round`.
    ///
    /// Called once per round with `current_round - lookback` to bound
    /// memory.
    pub fn prune(&mut self, before_round: u64) {
        self.records.retain(|_, &mut round| round >= before_round);
    }

    /// Returns the number of retained pair records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exports all records as snapshot rows.
    #[must_use]
    pub fn export(&self) -> Vec<HistoryRecord> {
        self.records
            .iter()
            .map(|(key, &round)| HistoryRecord {
                first: key.0.clone(),
                second: key.1.clone(),
                round,
            })
            .collect()
    }

    /// Replaces the ledger contents from restored snapshot rows.
    pub fn restore(&mut self, records: Vec<HistoryRecord>) {
        self.records = records
            .into_iter()
            .map(|r| (PairKey::new(&r.first, &r.second), r.round))
            .collect();
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn id(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    #[test]
    fn key_is_unordered() {
        assert_eq!(
            PairKey::new(&id("a"), &id("b")),
            PairKey::new(&id("b"), &id("a"))
        );
    }

    #[test]
    fn record_then_lookup_both_orders() {
        let mut ledger = HistoryLedger::new();
        ledger.record(&id("a"), &id("b"), 5);
        assert!(ledger.has_paired(&id("a"), &id("b"), 6, 3));
        assert!(ledger.has_paired(&id("b"), &id("a"), 6, 3));
    }

    #[test]
    fn outside_lookback_window_is_clear() {
        let mut ledger = HistoryLedger::new();
        ledger.record(&id("a"), &id("b"), 5);
        // round 9 is 4 rounds after 5; lookback 3 no longer blocks.
        assert!(!ledger.has_paired(&id("a"), &id("b"), 9, 3));
        assert!(ledger.has_paired(&id("a"), &id("b"), 8, 3));
    }

    #[test]
    fn lookback_zero_never_blocks() {
        let mut ledger = HistoryLedger::new();
        ledger.record(&id("a"), &id("b"), 5);
        assert!(!ledger.has_paired(&id("a"), &id("b"), 6, 0));
    }

    #[test]
    fn record_overwrites_with_newer_round() {
        let mut ledger = HistoryLedger::new();
        ledger.record(&id("a"), &id("b"), 1);
        ledger.record(&id("a"), &id("b"), 8);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.has_paired(&id("a"), &id("b"), 9, 2));
    }

    #[test]
    fn prune_drops_old_records() {
        let mut ledger = HistoryLedger::new();
        ledger.record(&id("a"), &id("b"), 1);
        ledger.record(&id("c"), &id("d"), 7);
        ledger.prune(5);
        assert_eq!(ledger.len(), 1);
        assert!(!ledger.has_paired(&id("a"), &id("b"), 2, 10));
        assert!(ledger.has_paired(&id("c"), &id("d"), 8, 10));
    }

    #[test]
    fn export_restore_round_trip() {
        let mut ledger = HistoryLedger::new();
        ledger.record(&id("a"), &id("b"), 3);
        ledger.record(&id("c"), &id("d"), 4);

        let mut restored = HistoryLedger::new();
        restored.restore(ledger.export());
        assert_eq!(restored.len(), 2);
        assert!(restored.has_paired(&id("b"), &id("a"), 4, 2));
    }
}
