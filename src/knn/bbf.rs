//! Best-bin-first approximate search.
//!
//! Pending subtrees sit in a priority queue keyed by the squared distance from
//! the query to their splitting plane. The closest one is expanded first, down
//! to a leaf, pushing every sibling passed on the way. The search stops after
//! `node_budget` leaves have been scanned, when the queue empties, or when
//! the smallest pending bound can no longer beat the k-th best candidate.

use log::trace;
use num_traits::{AsPrimitive, Float};

use super::heap_utils::{BranchQueue, KBestNeighbors};
use super::kd_tree::{KdTree, ROOT};
use super::{into_neighbors, validate_query};
use crate::common_types::Neighbor;
use crate::error::{KdTreeError, Result};

impl<F> KdTree<F>
where
    F: Float + AsPrimitive<f64>,
{
    /// Approximate nearest neighbour, scanning at most `node_budget` leaves.
    ///
    /// The returned distance is never below the true nearest distance. With
    /// `node_budget >= len()` the result is exact.
    pub fn nearest_approx(&self, query: &[F], node_budget: usize) -> Result<Neighbor> {
        self.k_nearest_approx(query, 1, node_budget)?
            .into_iter()
            .next()
            .ok_or(KdTreeError::EmptyIndex)
    }

    /// Approximate `k` nearest neighbours, scanning at most `node_budget` leaves.
    pub fn k_nearest_approx(
        &self,
        query: &[F],
        k: usize,
        node_budget: usize,
    ) -> Result<Vec<Neighbor>> {
        validate_query(query, self.dimension())?;
        if node_budget == 0 {
            return Err(KdTreeError::InvalidInput(
                "node_budget must be greater than 0".to_string(),
            ));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        Ok(into_neighbors(self.best_bin_first(query, k, node_budget)))
    }

    fn best_bin_first(&self, query: &[F], k: usize, node_budget: usize) -> KBestNeighbors<usize> {
        let mut best = KBestNeighbors::new(k.min(self.len()));
        let mut queue = BranchQueue::new();
        queue.push(ROOT, 0.0);

        let mut leaves_scanned = 0;
        while let Some((id, bound)) = queue.pop() {
            if leaves_scanned >= node_budget {
                trace!(
                    "best-bin-first budget of {} leaves spent with {} branches pending",
                    node_budget,
                    queue.len() + 1
                );
                break;
            }
            // Bounds pop in ascending order, so nothing left can improve or tie.
            if bound > best.pruning_bound() {
                break;
            }
            let leaf = self.descend(id, query, |far, far_bound| queue.push(far, far_bound));
            self.scan_leaf(leaf, query, &mut best);
            leaves_scanned += 1;
        }
        best
    }
}
