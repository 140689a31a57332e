//! Nearest-neighbour search over fixed-dimension feature vectors.
//!
//! The [`kd_tree`] module builds the index, [`partition`] holds the split
//! heuristic, and each search strategy lives in its own module.

use num_traits::{AsPrimitive, Float};

use crate::common_types::Neighbor;
use crate::error::{KdTreeError, Result};
use heap_utils::KBestNeighbors;

pub mod bbf;
pub mod brute_force;
pub mod heap_utils;
pub mod kd_tree;
pub mod partition;

/// Index of a node in a [`kd_tree::KdTree`]'s node arena.
pub type NodeId = usize;

/// Defines how a query is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchStrategy {
    /// Descend to a leaf, then backtrack into every subtree whose splitting
    /// plane is closer than the current best. Always exact.
    #[default]
    ExactBacktrack,
    /// Visit leaves in order of increasing lower-bound distance, stopping after
    /// `node_budget` leaves. Never underestimates the true distance.
    BestBinFirst { node_budget: usize },
    /// Linear scan over every stored feature.
    BruteForce,
}

/// Sum of squared per-dimension differences, accumulated in `f64`.
#[inline]
pub fn squared_euclidean<F: AsPrimitive<f64>>(a: &[F], b: &[F]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let diff = x.as_() - y.as_();
            diff * diff
        })
        .sum()
}

/// Euclidean (L2) distance between two vectors of equal length.
#[inline]
pub fn euclidean<F: AsPrimitive<f64>>(a: &[F], b: &[F]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Checks that a query can be compared against `dimension`-sized features.
pub(crate) fn validate_query<F: Float>(query: &[F], dimension: usize) -> Result<()> {
    if query.len() != dimension {
        return Err(KdTreeError::DimensionMismatch {
            expected: dimension,
            actual: query.len(),
        });
    }
    if query.iter().any(|v| !v.is_finite()) {
        return Err(KdTreeError::InvalidInput(
            "query has a non-finite component".to_string(),
        ));
    }
    Ok(())
}

/// Turns squared-distance candidates into neighbors, closest first. The
/// square root is taken here, once per result.
pub(crate) fn into_neighbors(best: KBestNeighbors<usize>) -> Vec<Neighbor> {
    best.into_sorted_vec()
        .into_iter()
        .map(|(dist_sq, index)| Neighbor {
            index,
            distance: dist_sq.sqrt(),
        })
        .collect()
}
