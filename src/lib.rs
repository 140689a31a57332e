//! # feature_index
//!
//! Nearest-neighbour retrieval over fixed-dimension feature vectors, built
//! around a KD-tree.
//!
//! - [`KdTree`] splits each node on its dimension of greatest variance at the
//!   median, and answers exact queries by backtracking.
//! - Best-bin-first search ([`KdTree::nearest_approx`]) bounds the work per
//!   query with a leaf budget.
//! - [`knn::brute_force`] scans a [`FeatureStore`] linearly.
//!
//! ```
//! use feature_index::{FeatureStore, KdTree};
//!
//! let store = FeatureStore::from_rows(&[[0.0f32, 0.0], [1.0, 1.0], [2.0, 2.0]])?;
//! let tree = KdTree::build(store)?;
//! let nearest = tree.nearest(&[1.9, 2.2])?;
//! assert_eq!(nearest.index, 2);
//! # Ok::<(), feature_index::KdTreeError>(())
//! ```

pub mod common_types;
pub mod error;
pub mod knn;

#[cfg(feature = "python")]
mod python;

pub use common_types::{FeatureStore, Neighbor};
pub use error::{KdTreeError, Result};
pub use knn::kd_tree::{KdTree, KdTreeConfig, KdTreeNode};
pub use knn::{euclidean, squared_euclidean, NodeId, SearchStrategy};
