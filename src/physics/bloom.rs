//! Re-bonding queue built at the end of recall.

use crate::foundation::core::DVec3;
use smallvec::SmallVec;
use std::collections::{BTreeSet, VecDeque};

/// One release of pairs; batches are small, so they stay inline.
pub type BloomBatch = SmallVec<[(usize, usize); 8]>;

/// Neighbours paired per body.
pub const NEIGHBORS_PER_BODY: usize = 3;

/// Pair every body with its `k` nearest neighbours by current distance, deduplicated by unordered
/// pair. Pairs come out as `(low, high)` in discovery order; distance ties resolve by index.
///
/// This approximates the original bond topology: irregular assemblies may be re-bonded
/// differently than they were built.
#[tracing::instrument(skip(positions), fields(bodies = positions.len()))]
pub fn nearest_pairs(positions: &[DVec3], k: usize) -> Vec<(usize, usize)> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for (i, p) in positions.iter().enumerate() {
        let mut others: Vec<(f64, usize)> = positions
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(j, q)| (p.distance_squared(*q), j))
            .collect();
        others.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        for &(_, j) in others.iter().take(k) {
            let pair = (i.min(j), i.max(j));
            if seen.insert(pair) {
                out.push(pair);
            }
        }
    }
    out
}

/// Fixed-size batches of body pairs consumed on a fixed cadence.
#[derive(Clone, Debug, PartialEq)]
pub struct BloomQueue {
    pending: VecDeque<(usize, usize)>,
    batch_size: usize,
    total: usize,
}

impl BloomQueue {
    /// Queue `pairs`, released `batch_size` at a time (at least one).
    pub fn new(pairs: Vec<(usize, usize)>, batch_size: usize) -> Self {
        Self {
            total: pairs.len(),
            pending: pairs.into(),
            batch_size: batch_size.max(1),
        }
    }

    /// Pairs queued at construction.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Pairs not yet released.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Whether every pair has been released.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Release the next batch.
    pub fn next_batch(&mut self) -> BloomBatch {
        let n = self.batch_size.min(self.pending.len());
        self.pending.drain(..n).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/physics/bloom.rs"]
mod tests;
