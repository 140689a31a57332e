//! Split selection for KD-tree nodes.
//!
//! A node is split on the dimension where its features vary the most, at the
//! median position along that dimension. Features are never moved: the tree
//! passes the slice of its index permutation that the node owns, and this
//! module reorders that slice in place.

use std::cmp::Ordering;

use log::warn;
use num_traits::{AsPrimitive, Float};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;

use crate::common_types::FeatureStore;

/// Result of partitioning one node's features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split<F> {
    pub pivot_dim: usize,
    pub pivot_val: F,
    /// Positions before this hold `value[pivot_dim] <= pivot_val`; positions
    /// at or after it hold `value[pivot_dim] >= pivot_val`.
    pub split_index: usize,
}

/// Median position of a group of `n >= 1` features. Biased left for even `n`.
#[inline]
pub fn median_index(n: usize) -> usize {
    (n - 1) / 2
}

/// Sample variance of component `dim` over the given features.
/// Undefined (NaN) for fewer than two features.
pub fn variance<F>(store: &FeatureStore<F>, indices: &[usize], dim: usize) -> f64
where
    F: Float + AsPrimitive<f64>,
{
    let length = indices.len();
    if length < 2 {
        return f64::NAN;
    }
    let mean = indices
        .iter()
        .map(|&i| store.component(i, dim).as_())
        .sum::<f64>()
        / length as f64;
    let sum_of_squared_differences = indices
        .iter()
        .map(|&i| {
            let difference = store.component(i, dim).as_() - mean;
            difference * difference
        })
        .sum::<f64>();
    sum_of_squared_differences / (length - 1) as f64
}

/// Dimension of greatest variance. Ties, including the all-zero case, resolve
/// to the lowest dimension.
pub fn max_variance_dimension<F>(store: &FeatureStore<F>, indices: &[usize]) -> usize
where
    F: Float + AsPrimitive<f64>,
{
    let mut best_dim = 0;
    let mut best_variance = f64::NEG_INFINITY;
    for dim in 0..store.dimension() {
        let v = variance(store, indices, dim);
        if v > best_variance {
            best_variance = v;
            best_dim = dim;
        }
    }
    best_dim
}

/// Total order on features along `dim`: by value, then by store index.
#[inline]
fn compare_on<F: Float>(store: &FeatureStore<F>, dim: usize, a: usize, b: usize) -> Ordering {
    store
        .component(a, dim)
        .partial_cmp(&store.component(b, dim))
        .unwrap_or(Ordering::Equal)
        .then(a.cmp(&b))
}

/// Chooses splits for the nodes of one build.
///
/// With a `variance_sample_size`, nodes larger than the sample estimate their
/// variances on a random subset drawn from a seeded generator, so two builds
/// with the same seed and input still produce the same tree.
#[derive(Debug)]
pub struct Partitioner {
    variance_sample_size: Option<usize>,
    rng: StdRng,
    sample: Vec<usize>,
}

impl Partitioner {
    pub fn new(variance_sample_size: Option<usize>, seed: u64) -> Self {
        let variance_sample_size = match variance_sample_size {
            Some(size) if size < 2 => {
                warn!("variance_sample_size {} is below 2; using exact variance", size);
                None
            }
            other => other,
        };
        Partitioner {
            variance_sample_size,
            rng: StdRng::seed_from_u64(seed),
            sample: Vec::new(),
        }
    }

    /// Picks the split dimension for `indices` and reorders them around the
    /// median along it. Returns `None` when there are fewer than two features.
    pub fn split<F>(&mut self, store: &FeatureStore<F>, indices: &mut [usize]) -> Option<Split<F>>
    where
        F: Float + AsPrimitive<f64>,
    {
        let n = indices.len();
        if n < 2 {
            return None;
        }

        let pivot_dim = match self.variance_sample_size {
            Some(sample_size) if n > sample_size => {
                self.sample.clear();
                let picks = index::sample(&mut self.rng, n, sample_size);
                self.sample.extend(picks.iter().map(|p| indices[p]));
                max_variance_dimension(store, &self.sample)
            }
            _ => max_variance_dimension(store, indices),
        };

        let m = median_index(n);
        let (_, pivot, _) =
            indices.select_nth_unstable_by(m, |&a, &b| compare_on(store, pivot_dim, a, b));
        let pivot_val = store.component(*pivot, pivot_dim);

        Some(Split {
            pivot_dim,
            pivot_val,
            split_index: m + 1,
        })
    }
}
