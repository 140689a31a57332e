//! KD-tree construction and exact search.
//!
//! Nodes live in a flat arena with the root at id 0. Every node owns a
//! contiguous range of the tree's index permutation; the ranges of two
//! siblings are disjoint and together cover their parent's range, so the
//! leaves partition the whole store. Construction and all searches use
//! explicit work stacks instead of recursion.

use std::fmt;

use log::debug;
use num_traits::{AsPrimitive, Float};

use super::heap_utils::KBestNeighbors;
use super::partition::Partitioner;
use super::{brute_force, into_neighbors, squared_euclidean, validate_query, NodeId, SearchStrategy};
use crate::common_types::{FeatureStore, Neighbor};
use crate::error::{KdTreeError, Result};

/// Id of the root node.
pub const ROOT: NodeId = 0;

/// Build parameters for a [`KdTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KdTreeConfig {
    /// Nodes with this many features or fewer become leaves. Must be at least 1.
    pub leaf_threshold: usize,
    /// Estimate split variances on a random sample of this size for nodes
    /// holding more features. `None` always uses every feature.
    pub variance_sample_size: Option<usize>,
    /// Seed for variance sampling.
    pub seed: u64,
}

impl KdTreeConfig {
    pub const DEFAULT_LEAF_THRESHOLD: usize = 1;

    pub fn new() -> Self {
        KdTreeConfig {
            leaf_threshold: Self::DEFAULT_LEAF_THRESHOLD,
            variance_sample_size: None,
            seed: 0,
        }
    }

    pub fn with_leaf_threshold(mut self, leaf_threshold: usize) -> Self {
        self.leaf_threshold = leaf_threshold;
        self
    }

    pub fn with_variance_sample_size(mut self, sample_size: usize) -> Self {
        self.variance_sample_size = Some(sample_size);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.leaf_threshold == 0 {
            return Err(KdTreeError::InvalidInput(
                "leaf_threshold must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A node of a [`KdTree`]: either internal, splitting its features on
/// `pivot_dim` at `pivot_val`, or a leaf. Pivot fields are meaningless on leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct KdTreeNode<F> {
    pivot_dim: usize,
    pivot_val: F,
    start: usize,
    end: usize,
    children: Option<(NodeId, NodeId)>,
}

impl<F: Float> KdTreeNode<F> {
    fn leaf(start: usize, end: usize) -> Self {
        KdTreeNode {
            pivot_dim: 0,
            pivot_val: F::zero(),
            start,
            end,
            children: None,
        }
    }

    pub fn pivot_dim(&self) -> usize {
        self.pivot_dim
    }

    pub fn pivot_val(&self) -> F {
        self.pivot_val
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// `(left, right)` child ids of an internal node.
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        self.children
    }

    /// Number of features in this subtree.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// An immutable KD-tree over an owned [`FeatureStore`].
///
/// Build once with [`KdTree::build`] or [`KdTree::build_with_config`]; there is
/// no insertion or removal. A built tree is `Sync`, so any number of threads
/// may query it concurrently.
#[derive(Debug, Clone)]
pub struct KdTree<F> {
    store: FeatureStore<F>,
    indices: Vec<usize>,
    nodes: Vec<KdTreeNode<F>>,
    config: KdTreeConfig,
}

impl<F> KdTree<F>
where
    F: Float + AsPrimitive<f64>,
{
    /// Builds a tree with the default configuration (leaf threshold 1).
    pub fn build(store: FeatureStore<F>) -> Result<Self> {
        Self::build_with_config(store, KdTreeConfig::default())
    }

    /// Copies `rows` into a store and builds a tree over it.
    pub fn from_rows<R: AsRef<[F]>>(rows: &[R], config: KdTreeConfig) -> Result<Self> {
        Self::build_with_config(FeatureStore::from_rows(rows)?, config)
    }

    /// Builds a tree over `store`.
    ///
    /// Fails with `InvalidInput` if the store is empty, a component is not
    /// finite, or the configuration is invalid, and with `OutOfMemory` if node
    /// storage cannot be reserved.
    pub fn build_with_config(store: FeatureStore<F>, config: KdTreeConfig) -> Result<Self> {
        config.validate()?;
        let n = store.len();
        if n == 0 {
            return Err(KdTreeError::InvalidInput(
                "cannot build an index from zero features".to_string(),
            ));
        }
        if let Some(pos) = store.as_slice().iter().position(|v| !v.is_finite()) {
            return Err(KdTreeError::InvalidInput(format!(
                "feature {} has a non-finite component",
                pos / store.dimension()
            )));
        }

        let mut indices = Vec::new();
        indices.try_reserve_exact(n)?;
        indices.extend(0..n);

        // n leaves at most, hence at most 2n - 1 nodes.
        let mut nodes = Vec::new();
        nodes.try_reserve_exact(2 * n - 1)?;
        nodes.push(KdTreeNode::leaf(0, n));

        let mut partitioner = Partitioner::new(config.variance_sample_size, config.seed);
        let mut pending = vec![ROOT];
        while let Some(id) = pending.pop() {
            let (start, end) = (nodes[id].start, nodes[id].end);
            if end - start <= config.leaf_threshold {
                continue;
            }
            let Some(split) = partitioner.split(&store, &mut indices[start..end]) else {
                continue;
            };

            let mid = start + split.split_index;
            let left = nodes.len();
            let right = left + 1;
            nodes.push(KdTreeNode::leaf(start, mid));
            nodes.push(KdTreeNode::leaf(mid, end));

            let node = &mut nodes[id];
            node.pivot_dim = split.pivot_dim;
            node.pivot_val = split.pivot_val;
            node.children = Some((left, right));

            pending.push(right);
            pending.push(left);
        }

        let tree = KdTree { store, indices, nodes, config };
        debug!(
            "built kd-tree: {} features, {} dimensions, {} nodes, {} leaves, depth {}",
            tree.len(),
            tree.dimension(),
            tree.node_count(),
            tree.leaf_count(),
            tree.depth()
        );
        Ok(tree)
    }

    pub fn dimension(&self) -> usize {
        self.store.dimension()
    }

    /// Number of indexed features.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Always false: a tree cannot be built from an empty store.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn config(&self) -> &KdTreeConfig {
        &self.config
    }

    pub fn store(&self) -> &FeatureStore<F> {
        &self.store
    }

    /// Returns the stored feature at `index` in input order.
    pub fn feature(&self, index: usize) -> Option<&[F]> {
        self.store.feature(index)
    }

    pub fn root(&self) -> &KdTreeNode<F> {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> Option<&KdTreeNode<F>> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[KdTreeNode<F>] {
        &self.nodes
    }

    /// Store indices of every feature in `node`'s subtree.
    pub fn node_indices(&self, node: &KdTreeNode<F>) -> &[usize] {
        &self.indices[node.start..node.end]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            match self.nodes[id].children {
                Some((left, right)) => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
                None => deepest = deepest.max(depth),
            }
        }
        deepest
    }

    /// Walks from `id` to a leaf, taking the left child when
    /// `query[pivot_dim] < pivot_val` and the right child otherwise. Each
    /// child passed over is reported with the squared distance from the query
    /// to its splitting plane, a lower bound for every feature under it.
    pub(crate) fn descend(
        &self,
        mut id: NodeId,
        query: &[F],
        mut on_branch: impl FnMut(NodeId, f64),
    ) -> NodeId {
        loop {
            let node = &self.nodes[id];
            match node.children {
                None => return id,
                Some((left, right)) => {
                    let diff = query[node.pivot_dim].as_() - node.pivot_val.as_();
                    let (near, far) = if diff < 0.0 { (left, right) } else { (right, left) };
                    on_branch(far, diff * diff);
                    id = near;
                }
            }
        }
    }

    /// Offers every feature of leaf `id` to `best`.
    pub(crate) fn scan_leaf(&self, id: NodeId, query: &[F], best: &mut KBestNeighbors<usize>) {
        for &index in self.node_indices(&self.nodes[id]) {
            best.add(squared_euclidean(query, self.store.row(index)), index);
        }
    }

    /// The leaf a query lands in when descending without backtracking.
    pub fn leaf_for(&self, query: &[F]) -> Result<&KdTreeNode<F>> {
        validate_query(query, self.dimension())?;
        let leaf = self.descend(ROOT, query, |_, _| {});
        Ok(&self.nodes[leaf])
    }

    /// Exact nearest neighbour of `query`. Equal distances resolve to the
    /// lowest index.
    pub fn nearest(&self, query: &[F]) -> Result<Neighbor> {
        self.k_nearest(query, 1)?
            .into_iter()
            .next()
            .ok_or(KdTreeError::EmptyIndex)
    }

    /// Exact `k` nearest neighbours of `query`, closest first. Equal distances
    /// come back in ascending index order. A `k` above `len()` returns every
    /// feature.
    pub fn k_nearest(&self, query: &[F], k: usize) -> Result<Vec<Neighbor>> {
        validate_query(query, self.dimension())?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let mut best = KBestNeighbors::new(k.min(self.len()));

        // Each entry is a subtree still to visit and the squared distance
        // from the query to the plane that separates it from the path taken.
        // A bound equal to the worst kept distance may still hide a tie with a
        // lower index, so only strictly larger bounds are pruned.
        let mut stack: Vec<(NodeId, f64)> = vec![(ROOT, 0.0)];
        while let Some((id, bound)) = stack.pop() {
            if bound > best.pruning_bound() {
                continue;
            }
            let leaf = self.descend(id, query, |far, far_bound| stack.push((far, far_bound)));
            self.scan_leaf(leaf, query, &mut best);
        }
        Ok(into_neighbors(best))
    }

    /// Every stored feature within `radius` of `query`, closest first.
    pub fn within_radius(&self, query: &[F], radius: f64) -> Result<Vec<Neighbor>> {
        validate_query(query, self.dimension())?;
        if radius.is_nan() || radius < 0.0 {
            return Err(KdTreeError::InvalidInput(format!(
                "radius must be non-negative, got {}",
                radius
            )));
        }
        let radius_sq = radius * radius;

        let mut found = Vec::new();
        let mut stack: Vec<(NodeId, f64)> = vec![(ROOT, 0.0)];
        while let Some((id, bound)) = stack.pop() {
            if bound > radius_sq {
                continue;
            }
            let leaf = self.descend(id, query, |far, far_bound| stack.push((far, far_bound)));
            for &index in self.node_indices(&self.nodes[leaf]) {
                let dist_sq = squared_euclidean(query, self.store.row(index));
                if dist_sq <= radius_sq {
                    found.push((dist_sq, index));
                }
            }
        }
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        Ok(found
            .into_iter()
            .map(|(dist_sq, index)| Neighbor {
                index,
                distance: dist_sq.sqrt(),
            })
            .collect())
    }

    /// Answers a `k`-nearest query with the given strategy.
    pub fn search(&self, query: &[F], k: usize, strategy: SearchStrategy) -> Result<Vec<Neighbor>> {
        match strategy {
            SearchStrategy::ExactBacktrack => self.k_nearest(query, k),
            SearchStrategy::BestBinFirst { node_budget } => {
                self.k_nearest_approx(query, k, node_budget)
            }
            SearchStrategy::BruteForce => brute_force::k_nearest(&self.store, query, k),
        }
    }

    /// Exact nearest neighbour of every feature in `queries`.
    pub fn nearest_batch(&self, queries: &FeatureStore<F>) -> Result<Vec<Neighbor>> {
        self.check_batch(queries)?;
        queries.iter().map(|query| self.nearest(query)).collect()
    }

    /// `k` nearest neighbours of every feature in `queries`.
    pub fn k_nearest_batch(
        &self,
        queries: &FeatureStore<F>,
        k: usize,
        strategy: SearchStrategy,
    ) -> Result<Vec<Vec<Neighbor>>> {
        self.check_batch(queries)?;
        queries
            .iter()
            .map(|query| self.search(query, k, strategy))
            .collect()
    }

    fn check_batch(&self, queries: &FeatureStore<F>) -> Result<()> {
        if queries.dimension() != self.dimension() {
            return Err(KdTreeError::DimensionMismatch {
                expected: self.dimension(),
                actual: queries.dimension(),
            });
        }
        Ok(())
    }
}

impl<F> fmt::Display for KdTree<F>
where
    F: Float + AsPrimitive<f64> + fmt::Display,
{
    /// One line per node in pre-order, indented by depth: internal nodes as
    /// `(pivot_dim, pivot_val, n)`, leaves as their store indices.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "KdTree(dimension={}, size={}, nodes={})",
            self.dimension(),
            self.len(),
            self.node_count()
        )?;
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id];
            write!(f, "{:indent$}", "", indent = depth * 4)?;
            match node.children {
                Some((left, right)) => {
                    writeln!(f, "({}, {}, {})", node.pivot_dim, node.pivot_val, node.len())?;
                    stack.push((right, depth + 1));
                    stack.push((left, depth + 1));
                }
                None => writeln!(f, "leaf {:?}", self.node_indices(node))?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn diagonal() -> KdTree<f64> {
        let rows = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        KdTree::from_rows(&rows, KdTreeConfig::default()).unwrap()
    }

    fn grid(n: usize) -> Vec<[f64; 3]> {
        (0..n)
            .map(|i| {
                let i = i as f64;
                [(i * 7.3) % 11.0, (i * 3.1) % 5.0, (i * 1.7) % 13.0]
            })
            .collect()
    }

    // Every feature under an internal node's left child is <= pivot, every
    // feature under its right child is >= pivot.
    fn assert_partition_invariant<F>(tree: &KdTree<F>)
    where
        F: Float + AsPrimitive<f64> + fmt::Debug,
    {
        for node in tree.nodes() {
            if let Some((left, right)) = node.children() {
                let (left, right) = (tree.node(left).unwrap(), tree.node(right).unwrap());
                assert_eq!(left.len() + right.len(), node.len());
                for &i in tree.node_indices(left) {
                    assert!(tree.feature(i).unwrap()[node.pivot_dim()] <= node.pivot_val());
                }
                for &i in tree.node_indices(right) {
                    assert!(tree.feature(i).unwrap()[node.pivot_dim()] >= node.pivot_val());
                }
            }
        }
    }

    #[test]
    fn test_diagonal_nearest() {
        let tree = diagonal();
        let nearest = tree.nearest(&[2.1, 2.1]).unwrap();
        assert_eq!(nearest.index, 2);
        assert_relative_eq!(nearest.distance, 0.02f64.sqrt(), epsilon = 1e-12);
        assert_eq!(tree.feature(nearest.index), Some(&[2.0, 2.0][..]));
    }

    #[test]
    fn test_diagonal_structure() {
        let tree = diagonal();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.dimension(), 2);
        assert_eq!(tree.root().pivot_dim(), 0);
        assert_eq!(tree.root().pivot_val(), 2.0);
        assert_eq!(tree.leaf_count(), 5);
        assert_eq!(tree.node_count(), 9);
        assert_eq!(tree.depth(), 3);
        assert_partition_invariant(&tree);
    }

    #[test]
    fn test_single_feature_tree() {
        let tree = KdTree::from_rows(&[[5.0, 5.0]], KdTreeConfig::default()).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.depth(), 0);

        let nearest = tree.nearest(&[8.0, 9.0]).unwrap();
        assert_eq!(nearest.index, 0);
        assert_relative_eq!(nearest.distance, 5.0);
    }

    #[test]
    fn test_identical_features() {
        let rows = vec![[1.0f32, 1.0]; 10];
        let tree = KdTree::from_rows(&rows, KdTreeConfig::default()).unwrap();
        assert_eq!(tree.len(), 10);
        assert_eq!(tree.leaf_count(), 10);
        assert!(tree.nodes().iter().all(|node| node.pivot_dim() == 0));
        assert_partition_invariant(&tree);

        let nearest = tree.nearest(&[1.0, 1.0]).unwrap();
        assert_eq!(tree.feature(nearest.index), Some(&[1.0f32, 1.0][..]));
        assert_eq!(nearest.distance, 0.0);
        assert_relative_eq!(tree.nearest(&[4.0, 5.0]).unwrap().distance, 5.0);
    }

    #[test]
    fn test_empty_store_is_invalid_input() {
        let store = FeatureStore::<f64>::with_dimension(2).unwrap();
        let err = KdTree::build(store).unwrap_err();
        assert!(matches!(err, KdTreeError::InvalidInput(_)));
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let tree = diagonal();
        assert_eq!(
            tree.nearest(&[1.0, 2.0, 3.0]).unwrap_err(),
            KdTreeError::DimensionMismatch { expected: 2, actual: 3 }
        );
        assert!(tree.nearest_approx(&[1.0], 4).is_err());
        assert!(tree.within_radius(&[1.0], 1.0).is_err());
        assert!(tree.leaf_for(&[]).is_err());
    }

    #[test]
    fn test_zero_leaf_threshold_rejected() {
        let err = KdTree::from_rows(&[[1.0, 2.0]], KdTreeConfig::new().with_leaf_threshold(0))
            .unwrap_err();
        assert!(matches!(err, KdTreeError::InvalidInput(_)));
    }

    #[test]
    fn test_non_finite_feature_rejected() {
        let rows = [[1.0, 2.0], [f64::NAN, 0.0]];
        let err = KdTree::from_rows(&rows, KdTreeConfig::default()).unwrap_err();
        assert_eq!(
            err,
            KdTreeError::InvalidInput("feature 1 has a non-finite component".to_string())
        );
    }

    #[test]
    fn test_partition_invariant_larger_set() {
        let tree = KdTree::from_rows(&grid(257), KdTreeConfig::default()).unwrap();
        assert_partition_invariant(&tree);
        assert_eq!(tree.leaf_count(), 257);
        // median splits keep the tree balanced
        assert_eq!(tree.depth(), 9);
    }

    #[test]
    fn test_leaf_threshold_bounds_leaf_size() {
        let config = KdTreeConfig::new().with_leaf_threshold(8);
        let tree = KdTree::from_rows(&grid(100), config).unwrap();
        assert_partition_invariant(&tree);
        let mut covered = 0;
        for node in tree.nodes().iter().filter(|node| node.is_leaf()) {
            assert!(node.len() >= 1 && node.len() <= 8);
            covered += node.len();
        }
        assert_eq!(covered, 100);
        for node in tree.nodes().iter().filter(|node| !node.is_leaf()) {
            assert!(node.len() > 8);
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let rows = grid(300);
        let a = KdTree::from_rows(&rows, KdTreeConfig::default()).unwrap();
        let b = KdTree::from_rows(&rows, KdTreeConfig::default()).unwrap();
        assert_eq!(a.nodes(), b.nodes());

        let sampled = KdTreeConfig::new().with_variance_sample_size(32).with_seed(7);
        let c = KdTree::from_rows(&rows, sampled).unwrap();
        let d = KdTree::from_rows(&rows, sampled).unwrap();
        assert_eq!(c.nodes(), d.nodes());
        assert_partition_invariant(&c);
    }

    #[test]
    fn test_k_nearest_matches_brute_force() {
        let tree = KdTree::from_rows(&grid(200), KdTreeConfig::new().with_leaf_threshold(4)).unwrap();
        for query in [[0.5, 0.5, 0.5], [10.0, 4.9, 12.9], [5.5, 2.5, 6.5], [-3.0, 8.0, 20.0]] {
            let exact = tree.k_nearest(&query, 5).unwrap();
            let oracle = brute_force::k_nearest(tree.store(), &query, 5).unwrap();
            assert_eq!(exact.len(), 5);
            for (a, b) in exact.iter().zip(oracle.iter()) {
                assert_relative_eq!(a.distance, b.distance, epsilon = 1e-12);
            }
            assert!(exact.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }

    #[test]
    fn test_k_larger_than_size_returns_everything() {
        let tree = diagonal();
        let all = tree.k_nearest(&[0.0, 0.0], 10).unwrap();
        let indices: Vec<usize> = all.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(tree.k_nearest(&[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_unbounded_k_returns_everything() {
        let tree = diagonal();
        let all = tree.k_nearest(&[0.0, 0.0], usize::MAX).unwrap();
        assert_eq!(all.len(), 5);
        let all = tree.search(&[0.0, 0.0], usize::MAX, SearchStrategy::BruteForce).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_equal_distances_come_back_by_index() {
        let rows = [[1.0]; 9];
        for leaf_threshold in [1, 2, 4] {
            let config = KdTreeConfig::new().with_leaf_threshold(leaf_threshold);
            let tree = KdTree::from_rows(&rows, config).unwrap();
            let found = tree.k_nearest(&[1.0], 9).unwrap();
            let indices: Vec<usize> = found.iter().map(|n| n.index).collect();
            assert_eq!(indices, (0..9).collect::<Vec<_>>());
            assert_eq!(tree.nearest(&[1.0]).unwrap().index, 0);
            assert_eq!(tree.nearest(&[3.0]).unwrap().index, 0);
        }
    }

    #[test]
    fn test_tie_across_splitting_plane() {
        // 0 and 2 are both at distance 1 from the query. They end up in
        // sibling leaves split at x = -1, and the descent reaches 2 first.
        let rows = [[-1.0, 0.0], [5.0, 5.0], [1.0, 0.0], [6.0, 6.0]];
        let tree = KdTree::from_rows(&rows, KdTreeConfig::default()).unwrap();
        let nearest = tree.nearest(&[0.0, 0.0]).unwrap();
        assert_eq!(nearest.index, 0);
        assert_eq!(nearest.distance, 1.0);
        let two: Vec<usize> = tree.k_nearest(&[0.0, 0.0], 2).unwrap().iter().map(|n| n.index).collect();
        assert_eq!(two, vec![0, 2]);
    }

    #[test]
    fn test_within_radius() {
        let tree = diagonal();
        let found = tree.within_radius(&[2.0, 2.0], 1.5).unwrap();
        let indices: Vec<usize> = found.iter().map(|n| n.index).collect();
        assert_eq!(indices[0], 2);
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3]);

        assert_eq!(tree.within_radius(&[2.0, 2.0], 0.0).unwrap().len(), 1);
        assert!(tree.within_radius(&[10.0, 10.0], 1.0).unwrap().is_empty());
        assert!(matches!(
            tree.within_radius(&[2.0, 2.0], -1.0),
            Err(KdTreeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_leaf_for() {
        let tree = diagonal();
        let leaf = tree.leaf_for(&[2.9, 0.0]).unwrap();
        assert!(leaf.is_leaf());
        assert_eq!(tree.node_indices(leaf), &[3]);
    }

    #[test]
    fn test_search_dispatch() {
        let tree = diagonal();
        let query = [3.6, 3.7];
        for strategy in [
            SearchStrategy::ExactBacktrack,
            SearchStrategy::BestBinFirst { node_budget: tree.len() },
            SearchStrategy::BruteForce,
        ] {
            let result = tree.search(&query, 1, strategy).unwrap();
            assert_eq!(result[0].index, 4, "strategy {:?}", strategy);
        }
    }

    #[test]
    fn test_batch_queries() {
        let tree = diagonal();
        let queries = FeatureStore::from_rows(&[[0.1, 0.0], [3.9, 4.2]]).unwrap();
        let nearest: Vec<usize> = tree
            .nearest_batch(&queries)
            .unwrap()
            .iter()
            .map(|n| n.index)
            .collect();
        assert_eq!(nearest, vec![0, 4]);

        let pairs = tree
            .k_nearest_batch(&queries, 2, SearchStrategy::ExactBacktrack)
            .unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1][1].index, 3);

        let wrong = FeatureStore::from_rows(&[[0.0, 0.0, 0.0]]).unwrap();
        assert!(matches!(
            tree.nearest_batch(&wrong),
            Err(KdTreeError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_display_dump() {
        let tree = KdTree::from_rows(&[[0.0, 0.0], [1.0, 0.0]], KdTreeConfig::default()).unwrap();
        let dump = tree.to_string();
        assert_eq!(
            dump,
            "KdTree(dimension=2, size=2, nodes=3)\n(0, 0, 2)\n    leaf [0]\n    leaf [1]\n"
        );
    }
}
