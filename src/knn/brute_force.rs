//! Linear-scan search over a [`FeatureStore`]. Serves as the reference result
//! for the tree searches and as the cheaper choice for small stores.

use num_traits::{AsPrimitive, Float};

use super::heap_utils::KBestNeighbors;
use super::{into_neighbors, squared_euclidean, validate_query};
use crate::common_types::{FeatureStore, Neighbor};
use crate::error::{KdTreeError, Result};

/// Nearest stored feature to `query`. Equal distances resolve to the lowest index.
pub fn nearest<F>(store: &FeatureStore<F>, query: &[F]) -> Result<Neighbor>
where
    F: Float + AsPrimitive<f64>,
{
    validate_query(query, store.dimension())?;
    let mut best: Option<(f64, usize)> = None;
    for (index, feature) in store.iter().enumerate() {
        let dist_sq = squared_euclidean(query, feature);
        if best.is_none_or(|(best_sq, _)| dist_sq < best_sq) {
            best = Some((dist_sq, index));
        }
    }
    best.map(|(dist_sq, index)| Neighbor {
        index,
        distance: dist_sq.sqrt(),
    })
    .ok_or(KdTreeError::EmptyIndex)
}

/// The `k` stored features closest to `query`, closest first. Equal distances
/// come back in ascending index order.
pub fn k_nearest<F>(store: &FeatureStore<F>, query: &[F], k: usize) -> Result<Vec<Neighbor>>
where
    F: Float + AsPrimitive<f64>,
{
    validate_query(query, store.dimension())?;
    if store.is_empty() {
        return Err(KdTreeError::EmptyIndex);
    }
    let mut best = KBestNeighbors::new(k.min(store.len()));
    for (index, feature) in store.iter().enumerate() {
        best.add(squared_euclidean(query, feature), index);
    }
    Ok(into_neighbors(best))
}
