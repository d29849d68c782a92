//! Matching algorithm: greedy first-fit with a maximum-matching fallback.
//!
//! Eligible pairings form a general graph over the queued pool snapshot,
//! where an edge `{a, b}` exists iff the ledger does not block the pair
//! within the lookback window. The matcher first runs a greedy first-fit
//! pass in pool order; if that leaves a participant unmatched while the
//! pool is at or below the configured search threshold, an Edmonds
//! blossom search augments the matching to maximum size, contracting the
//! odd cycles a plain alternating-path search cannot see through. Both
//! passes iterate strictly in pool-snapshot order, so identical inputs
//! always produce identical output.

use std::collections::VecDeque;

use super::ledger::HistoryLedger;
use super::participant::ParticipantId;

/// Result of one matching computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Disjoint pairs, each in snapshot order, the list ordered by the
    /// earlier member's snapshot position.
    pub pairs: Vec<(ParticipantId, ParticipantId)>,
    /// Participants left `Queued` for the next round: the odd-pool
    /// leftover and anyone whose every potential partner is blocked by
    /// history. Reported, not an error.
    pub unmatched: Vec<ParticipantId>,
}

/// Computes a matching over the queued pool snapshot.
///
/// `round` is the round being formed and `lookback` the no-repeat window
/// applied to it. Pools larger than `search_threshold` get the greedy
/// pass only; smaller pools additionally get the augmenting-path search
/// for every participant greedy could not place.
#[must_use]
pub fn compute(
    snapshot: &[ParticipantId],
    ledger: &HistoryLedger,
    round: u64,
    lookback: u64,
    search_threshold: usize,
) -> MatchOutcome {
    let n = snapshot.len();
    if n < 2 {
        return MatchOutcome {
            pairs: Vec::new(),
            unmatched: snapshot.to_vec(),
        };
    }

    let eligible = |i: usize, j: usize| -> bool {
        match (snapshot.get(i), snapshot.get(j)) {
            (Some(a), Some(b)) => i != j && !ledger.has_paired(a, b, round, lookback),
            _ => false,
        }
    };

    // partner[i] = index of i's current partner, if any.
    let mut partner: Vec<Option<usize>> = vec![None; n];

    // Greedy first-fit in arrival order; earliest-joined eligible
    // partner wins.
    for i in 0..n {
        if partner.get(i).copied().flatten().is_some() {
            continue;
        }
        for j in (i + 1)..n {
            if partner.get(j).copied().flatten().is_none() && eligible(i, j) {
                set_partner(&mut partner, i, j);
                break;
            }
        }
    }

    // Maximum-matching fallback, bounded to small pools.
    if n <= search_threshold {
        let mut search = BlossomSearch::new(n, &eligible, partner);
        for i in 0..n {
            if search.mate_of(i).is_none() {
                search.try_augment(i);
            }
        }
        partner = search.into_mates();
    }

    collect(snapshot, &partner)
}

/// Edmonds blossom search over the eligibility graph.
///
/// Grows a BFS tree of alternating paths from a free vertex. When two
/// even-level vertices meet, the enclosing odd cycle is contracted by
/// re-basing its vertices, so augmenting paths can pass through it.
/// Augmenting from a free vertex never unmatches anyone, so pairs taken
/// by the greedy pass survive.
struct BlossomSearch<'a> {
    n: usize,
    eligible: &'a dyn Fn(usize, usize) -> bool,
    mate: Vec<Option<usize>>,
    parent: Vec<Option<usize>>,
    base: Vec<usize>,
}

impl<'a> BlossomSearch<'a> {
    fn new(n: usize, eligible: &'a dyn Fn(usize, usize) -> bool, mate: Vec<Option<usize>>) -> Self {
        Self {
            n,
            eligible,
            mate,
            parent: vec![None; n],
            base: (0..n).collect(),
        }
    }

    fn mate_of(&self, v: usize) -> Option<usize> {
        self.mate.get(v).copied().flatten()
    }

    fn parent_of(&self, v: usize) -> Option<usize> {
        self.parent.get(v).copied().flatten()
    }

    fn base_of(&self, v: usize) -> usize {
        self.base.get(v).copied().unwrap_or(v)
    }

    fn set_mate(&mut self, v: usize, m: Option<usize>) {
        if let Some(slot) = self.mate.get_mut(v) {
            *slot = m;
        }
    }

    fn set_parent(&mut self, v: usize, p: Option<usize>) {
        if let Some(slot) = self.parent.get_mut(v) {
            *slot = p;
        }
    }

    /// Walks base-to-root chains from both endpoints and returns the
    /// first common ancestor base, the contraction point of the blossom.
    fn lca(&self, a: usize, b: usize) -> usize {
        let mut marked = vec![false; self.n];
        let mut v = self.base_of(a);
        loop {
            if let Some(flag) = marked.get_mut(v) {
                *flag = true;
            }
            let Some(up) = self.mate_of(v).and_then(|m| self.parent_of(m)) else {
                break;
            };
            v = self.base_of(up);
        }
        let mut v = self.base_of(b);
        loop {
            if marked.get(v).copied().unwrap_or(false) {
                return v;
            }
            let Some(up) = self.mate_of(v).and_then(|m| self.parent_of(m)) else {
                return v;
            };
            v = self.base_of(up);
        }
    }

    /// Marks blossom membership along the path from `v` down to the base
    /// `b`, re-parenting the odd-level vertices toward `child`.
    fn mark_path(&mut self, mut v: usize, b: usize, mut child: usize, blossom: &mut [bool]) {
        while self.base_of(v) != b {
            let Some(m) = self.mate_of(v) else { break };
            if let Some(flag) = blossom.get_mut(self.base_of(v)) {
                *flag = true;
            }
            if let Some(flag) = blossom.get_mut(self.base_of(m)) {
                *flag = true;
            }
            self.set_parent(v, Some(child));
            child = m;
            let Some(next) = self.parent_of(m) else { break };
            v = next;
        }
    }

    /// Attempts to grow the matching with one augmenting path from the
    /// free vertex `root`. Returns `true` if the matching grew.
    fn try_augment(&mut self, root: usize) -> bool {
        self.parent = vec![None; self.n];
        self.base = (0..self.n).collect();
        let mut used = vec![false; self.n];
        if let Some(flag) = used.get_mut(root) {
            *flag = true;
        }
        let mut queue = VecDeque::from([root]);

        while let Some(v) = queue.pop_front() {
            for to in 0..self.n {
                if !(self.eligible)(v, to)
                    || self.base_of(v) == self.base_of(to)
                    || self.mate_of(v) == Some(to)
                {
                    continue;
                }
                let closes_cycle =
                    to == root || self.mate_of(to).is_some_and(|m| self.parent_of(m).is_some());
                if closes_cycle {
                    let cur_base = self.lca(v, to);
                    let mut blossom = vec![false; self.n];
                    self.mark_path(v, cur_base, to, &mut blossom);
                    self.mark_path(to, cur_base, v, &mut blossom);
                    for i in 0..self.n {
                        if blossom.get(self.base_of(i)).copied().unwrap_or(false) {
                            if let Some(slot) = self.base.get_mut(i) {
                                *slot = cur_base;
                            }
                            if !used.get(i).copied().unwrap_or(true) {
                                if let Some(flag) = used.get_mut(i) {
                                    *flag = true;
                                }
                                queue.push_back(i);
                            }
                        }
                    }
                } else if self.parent_of(to).is_none() {
                    self.set_parent(to, Some(v));
                    match self.mate_of(to) {
                        None => {
                            self.augment_along(to);
                            return true;
                        }
                        Some(m) => {
                            if let Some(flag) = used.get_mut(m) {
                                *flag = true;
                            }
                            queue.push_back(m);
                        }
                    }
                }
            }
        }
        false
    }

    /// Flips matched and unmatched edges along the alternating path
    /// ending at the newly reached free vertex `v`.
    fn augment_along(&mut self, v: usize) {
        let mut cur = Some(v);
        while let Some(node) = cur {
            let Some(pv) = self.parent_of(node) else { break };
            let ppv = self.mate_of(pv);
            self.set_mate(node, Some(pv));
            self.set_mate(pv, Some(node));
            cur = ppv;
        }
    }

    fn into_mates(self) -> Vec<Option<usize>> {
        self.mate
    }
}

fn set_partner(partner: &mut [Option<usize>], i: usize, j: usize) {
    if let Some(slot) = partner.get_mut(i) {
        *slot = Some(j);
    }
    if let Some(slot) = partner.get_mut(j) {
        *slot = Some(i);
    }
}

fn collect(snapshot: &[ParticipantId], partner: &[Option<usize>]) -> MatchOutcome {
    let mut pairs = Vec::new();
    let mut unmatched = Vec::new();
    for (i, id) in snapshot.iter().enumerate() {
        match partner.get(i).copied().flatten() {
            Some(j) if j > i => {
                if let Some(other) = snapshot.get(j) {
                    pairs.push((id.clone(), other.clone()));
                }
            }
            Some(_) => {}
            None => unmatched.push(id.clone()),
        }
    }
    MatchOutcome { pairs, unmatched }
}
