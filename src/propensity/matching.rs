//! propensity::matching — 1-nearest-neighbor search on scalar scores.
//!
//! Both strategies answer the same query: for each treated score, the index
//! of the control with the smallest absolute score difference. Ties (equal
//! distance, including duplicate control scores) resolve to the lowest
//! control index, so the two strategies return identical answers.
//!
//! - [`SortedScan`]: sort once, binary-search per query. `O((m + q) log m)`.
//! - [`LinearScan`]: brute force. `O(m·q)`; the reference for `SortedScan`.
//!
//! Scores are expected to be finite; both strategies order with
//! `f64::total_cmp`, so NaN input cannot panic but yields unspecified
//! matches.

use crate::propensity::NeighborSearch;

/// Sort-and-bisect nearest-neighbor search (default).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortedScan;

/// Brute-force nearest-neighbor search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearScan;

impl NeighborSearch for SortedScan {
    fn nearest(&self, controls: &[f64], queries: &[f64]) -> Vec<usize> {
        if controls.is_empty() {
            return Vec::new();
        }
        // Stable sort by score keeps equal scores in index order, so the
        // first element of an equal-score block has the lowest index.
        let mut order: Vec<usize> = (0..controls.len()).collect();
        order.sort_by(|&a, &b| controls[a].total_cmp(&controls[b]));
        let sorted: Vec<f64> = order.iter().map(|&i| controls[i]).collect();
        let block_start = |score: f64| sorted.partition_point(|s| s.total_cmp(&score).is_lt());

        queries
            .iter()
            .map(|&q| {
                let pos = sorted.partition_point(|s| s.total_cmp(&q).is_lt());
                let below = pos.checked_sub(1).map(|k| order[block_start(sorted[k])]);
                let above = sorted.get(pos).map(|&s| order[block_start(s)]);
                match (below, above) {
                    (Some(lo), Some(hi)) => {
                        let d_lo = (q - controls[lo]).abs();
                        let d_hi = (controls[hi] - q).abs();
                        if d_lo < d_hi || (d_lo == d_hi && lo < hi) { lo } else { hi }
                    }
                    (Some(lo), None) => lo,
                    (None, Some(hi)) => hi,
                    (None, None) => 0,
                }
            })
            .collect()
    }
}

impl NeighborSearch for LinearScan {
    fn nearest(&self, controls: &[f64], queries: &[f64]) -> Vec<usize> {
        if controls.is_empty() {
            return Vec::new();
        }
        queries
            .iter()
            .map(|&q| {
                let mut best = 0;
                let mut best_dist = (q - controls[0]).abs();
                for (i, &c) in controls.iter().enumerate().skip(1) {
                    let dist = (q - c).abs();
                    if dist < best_dist {
                        best = i;
                        best_dist = dist;
                    }
                }
                best
            })
            .collect()
    }
}
