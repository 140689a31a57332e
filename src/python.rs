//! Python bindings, built with the `python` feature.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::common_types::{FeatureStore, Neighbor};
use crate::error::KdTreeError;
use crate::knn::kd_tree::{KdTree, KdTreeConfig};
use crate::knn::{self, brute_force};

impl From<KdTreeError> for PyErr {
    fn from(err: KdTreeError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn to_pairs(neighbors: Vec<Neighbor>) -> Vec<(usize, f64)> {
    neighbors.into_iter().map(|n| (n.index, n.distance)).collect()
}

fn check_lengths(a: &[f64], b: &[f64]) -> PyResult<()> {
    if a.len() != b.len() {
        return Err(PyValueError::new_err("Input vectors must have the same length."));
    }
    Ok(())
}

/// Euclidean distance between two vectors of f64.
#[pyfunction]
fn euclidean_distance(a: Vec<f64>, b: Vec<f64>) -> PyResult<f64> {
    check_lengths(&a, &b)?;
    Ok(knn::euclidean(&a, &b))
}

/// Squared Euclidean distance between two vectors of f64.
#[pyfunction]
fn squared_euclidean_distance(a: Vec<f64>, b: Vec<f64>) -> PyResult<f64> {
    check_lengths(&a, &b)?;
    Ok(knn::squared_euclidean(&a, &b))
}

/// A KD-tree over a list of equal-length float vectors. Queries return
/// `(index, distance)` pairs, where `index` is the position in the input list.
#[pyclass(name = "KdTree", frozen)]
struct PyKdTree {
    tree: KdTree<f64>,
}

#[pymethods]
impl PyKdTree {
    #[new]
    #[pyo3(signature = (features, leaf_threshold = 1))]
    fn new(features: Vec<Vec<f64>>, leaf_threshold: usize) -> PyResult<Self> {
        let config = KdTreeConfig::new().with_leaf_threshold(leaf_threshold);
        let tree = KdTree::from_rows(&features, config)?;
        Ok(PyKdTree { tree })
    }

    fn nearest(&self, query: Vec<f64>) -> PyResult<(usize, f64)> {
        let n = self.tree.nearest(&query)?;
        Ok((n.index, n.distance))
    }

    fn k_nearest(&self, query: Vec<f64>, k: usize) -> PyResult<Vec<(usize, f64)>> {
        Ok(to_pairs(self.tree.k_nearest(&query, k)?))
    }

    #[pyo3(signature = (query, node_budget, k = 1))]
    fn nearest_approx(&self, query: Vec<f64>, node_budget: usize, k: usize) -> PyResult<Vec<(usize, f64)>> {
        Ok(to_pairs(self.tree.k_nearest_approx(&query, k, node_budget)?))
    }

    fn within_radius(&self, query: Vec<f64>, radius: f64) -> PyResult<Vec<(usize, f64)>> {
        Ok(to_pairs(self.tree.within_radius(&query, radius)?))
    }

    #[pyo3(signature = (query, k = 1))]
    fn brute_force(&self, query: Vec<f64>, k: usize) -> PyResult<Vec<(usize, f64)>> {
        Ok(to_pairs(brute_force::k_nearest(self.tree.store(), &query, k)?))
    }

    #[getter]
    fn dimension(&self) -> usize {
        self.tree.dimension()
    }

    fn __len__(&self) -> usize {
        self.tree.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "KdTree(dimension={}, size={}, nodes={})",
            self.tree.dimension(),
            self.tree.len(),
            self.tree.node_count()
        )
    }
}

/// Linear scan over `features` without building a tree.
#[pyfunction]
#[pyo3(signature = (features, query, k = 1))]
fn brute_force_search(features: Vec<Vec<f64>>, query: Vec<f64>, k: usize) -> PyResult<Vec<(usize, f64)>> {
    let store = FeatureStore::from_rows(&features)?;
    Ok(to_pairs(brute_force::k_nearest(&store, &query, k)?))
}

/// A Python module implemented in Rust.
#[pymodule]
fn feature_index(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(euclidean_distance, m)?)?;
    m.add_function(wrap_pyfunction!(squared_euclidean_distance, m)?)?;
    m.add_function(wrap_pyfunction!(brute_force_search, m)?)?;
    m.add_class::<PyKdTree>()?;
    Ok(())
}
