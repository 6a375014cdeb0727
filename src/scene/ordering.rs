//! Deterministic bottom-up piece ordering.
//!
//! Pieces sort by bounding-box minimum Y, then centroid Y, then identifier. Float keys are
//! compared with a tolerance: values are first grouped into tiers by single-linkage over the sorted
//! values (consecutive values within [`ORDER_TOLERANCE`] share a tier), so near-equal keys tie while
//! the resulting comparison stays a strict total order.

use crate::scene::piece::Piece;
use std::cmp::Ordering;

/// Two key values closer than this are treated as equal.
pub const ORDER_TOLERANCE: f64 = 1e-6;

/// Sort key of one piece within a particular piece set.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderKey {
    /// Tier of the bounding-box minimum Y.
    pub min_y_tier: usize,
    /// Tier of the centroid Y within the min-Y tier.
    pub centroid_tier: usize,
    /// Piece identifier.
    pub id: String,
    /// Input position, only reached when identifiers collide.
    pub index: usize,
}

fn tiers(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut out = vec![0; values.len()];
    let mut tier = 0;
    for w in 0..idx.len() {
        if w > 0 && values[idx[w]] - values[idx[w - 1]] > ORDER_TOLERANCE {
            tier += 1;
        }
        out[idx[w]] = tier;
    }
    out
}

/// Compute the sort key of every piece.
pub fn order_keys(pieces: &[Piece]) -> Vec<OrderKey> {
    let min_y: Vec<f64> = pieces.iter().map(|p| p.bounds.min.y).collect();
    let centroid_y: Vec<f64> = pieces.iter().map(|p| p.centroid().y).collect();
    let min_tiers = tiers(&min_y);

    // Centroid tiers are computed inside each min-Y tier so a far-away piece cannot chain two
    // otherwise distinct centroids together.
    let mut centroid_tiers = vec![0; pieces.len()];
    let tier_count = min_tiers.iter().copied().max().map_or(0, |m| m + 1);
    for t in 0..tier_count {
        let members: Vec<usize> = (0..pieces.len()).filter(|&i| min_tiers[i] == t).collect();
        let vals: Vec<f64> = members.iter().map(|&i| centroid_y[i]).collect();
        for (k, ct) in tiers(&vals).into_iter().enumerate() {
            centroid_tiers[members[k]] = ct;
        }
    }

    pieces
        .iter()
        .enumerate()
        .map(|(i, p)| OrderKey {
            min_y_tier: min_tiers[i],
            centroid_tier: centroid_tiers[i],
            id: p.id.clone(),
            index: i,
        })
        .collect()
}

/// Indices of `pieces` in reveal order (lowest first).
pub fn piece_order(pieces: &[Piece]) -> Vec<usize> {
    let keys = order_keys(pieces);
    let mut order: Vec<usize> = (0..pieces.len()).collect();
    order.sort_by(|&a, &b| compare_keys(&keys[a], &keys[b]));
    order
}

/// Total order over keys produced by the same [`order_keys`] call.
pub fn compare_keys(a: &OrderKey, b: &OrderKey) -> Ordering {
    a.cmp(b)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/ordering.rs"]
mod tests;
