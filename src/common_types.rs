//! This module contains the data structures shared by every search strategy.

use crate::error::{KdTreeError, Result};

/// A row-major collection of fixed-dimension feature vectors.
///
/// The store owns a copy of the caller's data, so an index built from it never
/// borrows caller memory. Feature `i` occupies `data[i * dimension..(i + 1) * dimension]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStore<F> {
    data: Vec<F>,
    dimension: usize,
}

impl<F: Copy> FeatureStore<F> {
    /// Wraps a flat buffer of `data.len() / dimension` features.
    pub fn new(data: Vec<F>, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(KdTreeError::InvalidInput(
                "feature dimension must be greater than 0".to_string(),
            ));
        }
        if data.len() % dimension != 0 {
            return Err(KdTreeError::InvalidInput(format!(
                "buffer of {} components is not a whole number of {}-dimensional features",
                data.len(),
                dimension
            )));
        }
        Ok(FeatureStore { data, dimension })
    }

    /// Creates an empty store for features of the given dimension.
    pub fn with_dimension(dimension: usize) -> Result<Self> {
        Self::new(Vec::new(), dimension)
    }

    /// Copies a list of rows into a store. The first row fixes the dimension.
    pub fn from_rows<R: AsRef<[F]>>(rows: &[R]) -> Result<Self> {
        let dimension = match rows.first() {
            Some(row) => row.as_ref().len(),
            None => {
                return Err(KdTreeError::InvalidInput(
                    "cannot infer a dimension from zero rows".to_string(),
                ));
            }
        };
        let mut store = Self::with_dimension(dimension)?;
        store.data.reserve(rows.len() * dimension);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dimension {
                return Err(KdTreeError::InvalidInput(format!(
                    "all features must have the same dimension. Found feature {} with {} components, expected {}",
                    i,
                    row.len(),
                    dimension
                )));
            }
            store.data.extend_from_slice(row);
        }
        Ok(store)
    }

    /// Appends one feature.
    pub fn push(&mut self, feature: &[F]) -> Result<()> {
        if feature.len() != self.dimension {
            return Err(KdTreeError::DimensionMismatch {
                expected: self.dimension,
                actual: feature.len(),
            });
        }
        self.data.extend_from_slice(feature);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns feature `index`, or `None` if it is out of range.
    pub fn feature(&self, index: usize) -> Option<&[F]> {
        let start = index.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Component `dim` of feature `index`. Both must be in range.
    #[inline]
    pub(crate) fn component(&self, index: usize, dim: usize) -> F {
        self.data[index * self.dimension + dim]
    }

    /// Row view used on hot paths where `index` is known to be valid.
    #[inline]
    pub(crate) fn row(&self, index: usize) -> &[F] {
        let start = index * self.dimension;
        &self.data[start..start + self.dimension]
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[F]> + '_ {
        self.data.chunks_exact(self.dimension)
    }

    pub fn as_slice(&self) -> &[F] {
        &self.data
    }
}

/// A stored feature found by a query: its position in the store and
/// its Euclidean distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}
