//! Exact-cover search over one candidate group.
//!
//! Phase 1 builds a reachability table indexed by (item index, sum): for each
//! suffix of the candidate list, which sums up to the target can be formed,
//! and with which cardinalities (a u64 bitmask, bit k = "some k-item subset").
//! Phase 2 walks the table from (0, target) and only ever descends into cells
//! that still lead to a cover, so enumeration cost is proportional to the
//! covers produced rather than to 2^n.
//!
//! Covers come out ordered by size, then lexicographically by item index.
//! Callers sort candidates by transaction id first, so index order is id order.

use std::collections::HashMap;
use std::time::Instant;

use crate::config::SearchConfig;
use crate::model::BudgetLimit;

/// Deadline checks are amortized over this many backtracking nodes.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

#[derive(Debug, Clone)]
pub struct SearchLimits {
    pub max_cover_size: usize,
    pub cover_size_slack: usize,
    pub max_covers: usize,
    pub max_dp_cells: u64,
    pub max_nodes: u64,
    pub deadline: Option<Instant>,
}

impl SearchLimits {
    pub fn from_config(search: &SearchConfig, deadline: Option<Instant>) -> Self {
        Self {
            max_cover_size: search.max_cover_size.min(63),
            cover_size_slack: search.cover_size_slack,
            max_covers: search.max_covers.max(1),
            max_dp_cells: search.max_dp_cells,
            max_nodes: search.max_nodes,
            deadline,
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverSearch {
    /// Index sets into the magnitudes slice, each ascending.
    pub covers: Vec<Vec<usize>>,
    /// Size of the smallest exact cover, when the target is reachable.
    pub min_size: Option<usize>,
    pub dp_cells: u64,
    pub nodes_visited: u64,
    /// A cap or the deadline stopped enumeration before every minimum-size
    /// cover was found.
    pub cap_hit: bool,
    /// Set when a bound stopped the search before any cover was produced.
    pub aborted: Option<BudgetLimit>,
}

enum Stop {
    CoverCap,
    NodeCap,
    Deadline,
}

/// Find exact covers of `target` using `magnitudes` (positive minor-unit
/// amounts). Returns every cover of size `min_size..=min_size + slack`, up to
/// `max_covers`. Zero magnitudes are never part of a cover.
pub fn find_exact_covers(magnitudes: &[i64], target: i64, limits: &SearchLimits) -> CoverSearch {
    let mut result = CoverSearch::default();
    if target <= 0 || magnitudes.is_empty() {
        return result;
    }

    let size_mask: u64 = if limits.max_cover_size >= 63 {
        u64::MAX
    } else {
        (1u64 << (limits.max_cover_size + 1)) - 1
    };

    // ----- Phase 1: reachability table, built from the last item backwards -----
    let n = magnitudes.len();
    let mut reach: Vec<HashMap<i64, u64>> = vec![HashMap::new(); n + 1];
    reach[n].insert(0, 1);
    result.dp_cells = 1;

    for i in (0..n).rev() {
        if limits.deadline_passed() {
            result.aborted = Some(BudgetLimit::Deadline);
            return result;
        }

        let a = magnitudes[i];
        let mut layer = reach[i + 1].clone();
        if a > 0 {
            for (&sum, &mask) in &reach[i + 1] {
                if a > target - sum {
                    continue;
                }
                let shifted = (mask << 1) & size_mask;
                if shifted != 0 {
                    *layer.entry(sum + a).or_insert(0) |= shifted;
                }
            }
        }

        result.dp_cells += layer.len() as u64;
        reach[i] = layer;

        if result.dp_cells > limits.max_dp_cells {
            result.aborted = Some(BudgetLimit::DpCells);
            return result;
        }
    }

    let Some(&mask) = reach[0].get(&target) else {
        return result;
    };
    let min_size = mask.trailing_zeros() as usize;
    result.min_size = Some(min_size);

    // ----- Phase 2: backtrack through feasible cells only -----
    let max_size = min_size
        .saturating_add(limits.cover_size_slack)
        .min(limits.max_cover_size);
    let mut walk = CoverWalk {
        magnitudes,
        reach: &reach,
        limits,
        covers: Vec::new(),
        stack: Vec::new(),
        nodes: 0,
        stop: None,
    };

    let mut stopped_in_min_tier = false;
    for size in min_size..=max_size {
        if mask & (1u64 << size) == 0 {
            continue;
        }
        walk.descend(0, target, size);
        if walk.stop.is_some() {
            stopped_in_min_tier = size == min_size;
            break;
        }
    }

    result.nodes_visited = walk.nodes;
    if let Some(stop) = walk.stop {
        // Only a stop inside the minimal tier can change the chosen cover
        result.cap_hit = stopped_in_min_tier;
        if walk.covers.is_empty() {
            result.aborted = Some(match stop {
                Stop::Deadline => BudgetLimit::Deadline,
                Stop::NodeCap | Stop::CoverCap => BudgetLimit::Nodes,
            });
        }
    }
    result.covers = walk.covers;
    result
}

struct CoverWalk<'a> {
    magnitudes: &'a [i64],
    reach: &'a [HashMap<i64, u64>],
    limits: &'a SearchLimits,
    covers: Vec<Vec<usize>>,
    stack: Vec<usize>,
    nodes: u64,
    stop: Option<Stop>,
}

impl CoverWalk<'_> {
    /// Can items `from..` form `remaining` with exactly `k` of them?
    fn feasible(&self, from: usize, remaining: i64, k: usize) -> bool {
        self.reach[from]
            .get(&remaining)
            .is_some_and(|mask| mask & (1u64 << k) != 0)
    }

    fn descend(&mut self, i: usize, remaining: i64, k: usize) {
        if self.stop.is_some() {
            return;
        }

        self.nodes += 1;
        if self.nodes > self.limits.max_nodes {
            self.stop = Some(Stop::NodeCap);
            return;
        }
        if self.nodes % DEADLINE_CHECK_INTERVAL == 0 && self.limits.deadline_passed() {
            self.stop = Some(Stop::Deadline);
            return;
        }

        if k == 0 {
            // feasible(.., r, 0) only holds for r == 0
            if self.covers.len() >= self.limits.max_covers {
                self.stop = Some(Stop::CoverCap);
                return;
            }
            self.covers.push(self.stack.clone());
            return;
        }
        if i >= self.magnitudes.len() {
            return;
        }

        // Include first, so covers of one size come out in lexicographic order
        let a = self.magnitudes[i];
        if a > 0 && a <= remaining && self.feasible(i + 1, remaining - a, k - 1) {
            self.stack.push(i);
            self.descend(i + 1, remaining - a, k - 1);
            self.stack.pop();
        }
        if self.feasible(i + 1, remaining, k) {
            self.descend(i + 1, remaining, k);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
