//! # VectorIndex
//!
//! Exact nearest-neighbor search over fixed-dimension embedding vectors.
//!
//! This module wraps the `hora` brute-force metric index and keeps the raw
//! vectors alongside it, so rows can be reconstructed without re-invoking an
//! external embedding service. Aisle builds two of these at startup — one over
//! product-only text embeddings, one over product+review embeddings — both
//! sharing row order with the [`Catalog`](crate::catalog::Catalog).
//!
//! ## Responsibilities
//! - **Indexing**: exact Euclidean search over the full catalog (`search`).
//! - **Reconstruction**: return the stored vector for a row (`reconstruct`).
//! - **Restriction**: build a temporary index over a subset of rows that maps
//!   hits back to original row ids (`restrict_to`).
//! - **Scoring**: distance→similarity conversion and cosine similarity.
//!
//! Scores produced by [`similarity_scores`] are *relative to one result set*:
//! the furthest candidate scores 0.0 and the rest scale linearly up to 1.0.
//! They must not be compared across queries or buffer sizes.
//!
//! ## Quick Example
//! ```
//! use aisle::vector_index::VectorIndex;
//!
//! # fn main() -> aisle::error::Result<()> {
//! let index = VectorIndex::build(3, vec![
//!     vec![1.0, 0.0, 0.0],
//!     vec![0.0, 1.0, 0.0],
//! ])?;
//! let hits = index.search(&[1.0, 0.1, 0.0], 2)?;
//! assert_eq!(hits[0].0, 0);
//! # Ok(()) }
//! ```

use hora::core::ann_index::ANNIndex;
use hora::core::metrics::Metric;
use hora::index::bruteforce_idx::BruteForceIndex;
use hora::index::bruteforce_params::BruteForceParams;

use crate::error::{Error, Result};

/// Exact-search index over uniform-length `f32` vectors.
///
/// Row ids are dense, 0-based, and assigned in insertion order, matching the
/// row order of the catalog snapshot the vectors came from.
pub struct VectorIndex {
    /// Brute-force metric index (exact; approximate tuning is out of scope).
    index: BruteForceIndex<f32, usize>,
    /// Raw vectors, kept for reconstruction and subset rebuilds.
    vectors: Vec<Vec<f32>>,
    /// Dimensionality enforced for every stored and queried vector.
    dimension: usize,
}

impl VectorIndex {
    /// Construct an index over the given vectors.
    ///
    /// # Parameters
    /// - `dimension`: Expected length of every vector.
    /// - `vectors`: One embedding per row, in row-id order.
    ///
    /// # Errors
    /// [`Error::DimensionMismatch`] if any vector differs from `dimension`,
    /// [`Error::Index`] if the underlying index rejects an insert or build.
    pub fn build(dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        let mut index = BruteForceIndex::new(dimension, &BruteForceParams::default());
        for (row_id, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    got: vector.len(),
                });
            }
            index.add(vector, row_id).map_err(Error::Index)?;
        }
        index.build(Metric::Euclidean).map_err(Error::Index)?;

        Ok(Self {
            index,
            vectors,
            dimension,
        })
    }

    /// Number of indexed rows.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// `true` when no vectors are loaded.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimensionality of the stored vectors.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Query for the `k` nearest rows to `query`.
    ///
    /// # Returns
    /// `(row_id, distance)` pairs sorted ascending by Euclidean distance,
    /// at most `min(k, len())` of them.
    ///
    /// # Errors
    /// [`Error::EmptyIndex`] when no vectors are loaded,
    /// [`Error::DimensionMismatch`] when the query has the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if self.vectors.is_empty() {
            return Err(Error::EmptyIndex);
        }
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }

        let mut hits: Vec<(usize, f32)> = self
            .index
            .search_nodes(query, k)
            .into_iter()
            .filter_map(|(node, distance)| node.idx().as_ref().map(|&row_id| (row_id, distance)))
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.truncate(k);

        Ok(hits)
    }

    /// Return the stored vector for `row_id`.
    ///
    /// Used by the rerank path to re-derive candidate embeddings without a
    /// round trip to the embedding service.
    ///
    /// # Errors
    /// [`Error::RowNotFound`] for out-of-range ids.
    pub fn reconstruct(&self, row_id: usize) -> Result<&[f32]> {
        self.vectors
            .get(row_id)
            .map(Vec::as_slice)
            .ok_or(Error::RowNotFound(row_id))
    }

    /// Build a temporary index over only the given rows.
    ///
    /// The returned [`SubsetIndex`] searches exactly those rows and maps hits
    /// back to the original row ids, so callers can narrow a candidate pool
    /// without scanning the full catalog.
    ///
    /// # Errors
    /// [`Error::RowNotFound`] if any id is out of range.
    pub fn restrict_to(&self, row_ids: &[usize]) -> Result<SubsetIndex> {
        let mut subset = Vec::with_capacity(row_ids.len());
        for &row_id in row_ids {
            subset.push(self.reconstruct(row_id)?.to_vec());
        }
        let inner = VectorIndex::build(self.dimension, subset)?;

        Ok(SubsetIndex {
            inner,
            rows: row_ids.to_vec(),
        })
    }
}

/// Temporary exact index over a subset of another index's rows.
///
/// Produced by [`VectorIndex::restrict_to`]; hits are reported in terms of
/// the *original* row ids.
pub struct SubsetIndex {
    inner: VectorIndex,
    rows: Vec<usize>,
}

impl SubsetIndex {
    /// The original row ids this subset covers, in subset order.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Query for the `k` nearest subset rows, reported as original row ids.
    ///
    /// # Errors
    /// Same contract as [`VectorIndex::search`].
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        let hits = self.inner.search(query, k)?;
        Ok(hits
            .into_iter()
            .map(|(local_id, distance)| (self.rows[local_id], distance))
            .collect())
    }
}

/// Convert a result set's distances into relative similarity scores.
///
/// `similarity = 1 - distance / max(distances)`, so the furthest candidate
/// scores exactly 0.0 and the nearest scores highest. When every candidate is
/// identical to the query (max distance 0), all score 1.0.
pub fn similarity_scores(distances: &[f32]) -> Vec<f32> {
    let Some(max_distance) = distances.iter().copied().reduce(f32::max) else {
        return Vec::new();
    };
    if max_distance == 0.0 {
        return vec![1.0; distances.len()];
    }
    distances.iter().map(|d| 1.0 - d / max_distance).collect()
}

/// Cosine similarity between two equal-length vectors, in [-1, 1].
///
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_vectors() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ]
    }

    #[test]
    fn build_rejects_ragged_vectors() {
        let result = VectorIndex::build(3, vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn search_orders_by_distance() {
        let index = VectorIndex::build(3, axis_vectors()).unwrap();
        let hits = index.search(&[0.9, 0.3, 0.0], 3).unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].0, 0);
        assert_eq!(hits[1].0, 1);
        assert_eq!(hits[2].0, 2);
        assert!(hits[0].1 <= hits[1].1 && hits[1].1 <= hits[2].1);
    }

    #[test]
    fn search_clamps_k_to_row_count() {
        let index = VectorIndex::build(3, axis_vectors()).unwrap();
        let hits = index.search(&[1.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn search_rejects_empty_index() {
        let index = VectorIndex::build(3, Vec::new()).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(Error::EmptyIndex)
        ));
    }

    #[test]
    fn search_rejects_wrong_query_shape() {
        let index = VectorIndex::build(3, axis_vectors()).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0], 1),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn reconstruct_round_trips_stored_vectors() {
        let index = VectorIndex::build(3, axis_vectors()).unwrap();
        assert_eq!(index.reconstruct(1).unwrap(), &[0.0, 1.0, 0.0]);
        assert!(matches!(index.reconstruct(7), Err(Error::RowNotFound(7))));
    }

    #[test]
    fn restrict_to_maps_back_to_original_rows() {
        let index = VectorIndex::build(3, axis_vectors()).unwrap();
        let subset = index.restrict_to(&[2, 0]).unwrap();

        assert_eq!(subset.rows(), &[2, 0]);
        let hits = subset.search(&[0.0, 0.0, 1.0], 2).unwrap();
        assert_eq!(hits[0].0, 2);
        assert_eq!(hits[1].0, 0);
    }

    #[test]
    fn restrict_to_rejects_out_of_range_rows() {
        let index = VectorIndex::build(3, axis_vectors()).unwrap();
        assert!(matches!(
            index.restrict_to(&[0, 9]),
            Err(Error::RowNotFound(9))
        ));
    }

    #[test]
    fn similarity_scores_are_bounded_and_anchored() {
        let scores = similarity_scores(&[0.0, 1.0, 2.0]);
        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!((scores[1] - 0.5).abs() < 1e-6);
        assert_eq!(scores[2], 0.0);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn similarity_scores_degenerate_to_one() {
        let scores = similarity_scores(&[0.0, 0.0]);
        assert_eq!(scores, vec![1.0, 1.0]);
        assert!(similarity_scores(&[]).is_empty());
    }

    #[test]
    fn cosine_similarity_identical_and_orthogonal() {
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }
}
