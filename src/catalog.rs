//! # Catalog
//!
//! Read-only product metadata, addressed by the same dense row ids as the
//! vector indices.
//!
//! The catalog is loaded once at startup from a bincode snapshot produced by
//! the offline embedding pipeline. Row order is the contract between the
//! catalog and the indices: a snapshot whose embedding matrices disagree with
//! the product rows is rejected loudly at load instead of serving misaligned
//! recommendations for the rest of the process lifetime.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// One catalog item, immutable once indexed.
///
/// `name` doubles as the external product identity: recommendations and the
/// summary cache refer to products by name, and [`Catalog::row_of`] resolves
/// a name back to its row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique display identifier.
    pub name: String,
    /// Reference to the product image (URL or asset path).
    pub image_ref: String,
    /// Average review rating, 0.0–5.0.
    pub rating: f32,
    /// Titles of the reviews folded into the combined embedding.
    pub review_titles: Vec<String>,
    /// Bodies of those reviews.
    pub review_texts: Vec<String>,
    /// Product description.
    pub description: String,
    /// Free-form feature text.
    pub features: String,
}

/// On-disk startup artifact: products plus both embedding matrices.
///
/// Produced offline, consumed wholesale at process start. The two matrices
/// must have exactly one row per product, in the same order, and every vector
/// must have length `dimension`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Embedding dimensionality shared by both matrices.
    pub dimension: usize,
    /// Product rows, in row-id order.
    pub products: Vec<Product>,
    /// Embeddings of name+description+features text.
    pub product_embeddings: Vec<Vec<f32>>,
    /// Embeddings that additionally fold in review text.
    pub combined_embeddings: Vec<Vec<f32>>,
}

impl CatalogSnapshot {
    /// Read and decode a snapshot from `path`.
    ///
    /// # Errors
    /// I/O failures, undecodable bytes, or a snapshot that fails
    /// [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let (snapshot, _): (CatalogSnapshot, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|e| Error::Snapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Encode and write this snapshot to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| Error::Snapshot(e.to_string()))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Check row-count and dimension alignment.
    ///
    /// # Errors
    /// [`Error::Snapshot`] describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        let rows = self.products.len();
        if self.product_embeddings.len() != rows {
            return Err(Error::Snapshot(format!(
                "{} products but {} product embeddings",
                rows,
                self.product_embeddings.len()
            )));
        }
        if self.combined_embeddings.len() != rows {
            return Err(Error::Snapshot(format!(
                "{} products but {} combined embeddings",
                rows,
                self.combined_embeddings.len()
            )));
        }
        for (row_id, vector) in self
            .product_embeddings
            .iter()
            .chain(self.combined_embeddings.iter())
            .enumerate()
        {
            if vector.len() != self.dimension {
                return Err(Error::Snapshot(format!(
                    "embedding {} has length {}, expected {}",
                    row_id % rows.max(1),
                    vector.len(),
                    self.dimension
                )));
            }
        }
        Ok(())
    }
}

/// Row store of product attributes, read-only for the process lifetime.
pub struct Catalog {
    products: Vec<Product>,
    rows_by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from product rows in row-id order.
    ///
    /// Product names are expected to be unique; a duplicate name resolves to
    /// its last occurrence.
    pub fn from_products(products: Vec<Product>) -> Self {
        let rows_by_name = products
            .iter()
            .enumerate()
            .map(|(row_id, product)| (product.name.clone(), row_id))
            .collect();
        Self {
            products,
            rows_by_name,
        }
    }

    /// Resolve a product name to its row id by exact, case-sensitive match.
    ///
    /// # Errors
    /// [`Error::UnknownProduct`] when the name is absent.
    pub fn row_of(&self, product_name: &str) -> Result<usize> {
        self.rows_by_name
            .get(product_name)
            .copied()
            .ok_or_else(|| Error::UnknownProduct(product_name.to_string()))
    }

    /// Attributes of the product at `row_id`.
    ///
    /// # Errors
    /// [`Error::RowNotFound`] for out-of-range ids.
    pub fn attributes_of(&self, row_id: usize) -> Result<&Product> {
        self.products.get(row_id).ok_or(Error::RowNotFound(row_id))
    }

    /// Number of catalog rows.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// `true` when the catalog holds no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> Product {
        Product {
            name: name.to_string(),
            image_ref: format!("https://img.example/{name}.jpg"),
            rating: 4.2,
            review_titles: vec!["Great fit".to_string()],
            review_texts: vec!["Fits as expected and washes well.".to_string()],
            description: format!("{name} description"),
            features: "cotton, machine washable".to_string(),
        }
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            dimension: 2,
            products: vec![product("Linen Shirt"), product("Wool Scarf")],
            product_embeddings: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            combined_embeddings: vec![vec![0.9, 0.1], vec![0.1, 0.9]],
        }
    }

    #[test]
    fn row_of_is_exact_and_case_sensitive() {
        let catalog = Catalog::from_products(vec![product("Linen Shirt")]);
        assert_eq!(catalog.row_of("Linen Shirt").unwrap(), 0);
        assert!(matches!(
            catalog.row_of("linen shirt"),
            Err(Error::UnknownProduct(_))
        ));
        assert!(matches!(
            catalog.row_of("Linen Shirt "),
            Err(Error::UnknownProduct(_))
        ));
    }

    #[test]
    fn attributes_of_checks_range() {
        let catalog = Catalog::from_products(vec![product("Linen Shirt")]);
        assert_eq!(catalog.attributes_of(0).unwrap().name, "Linen Shirt");
        assert!(matches!(
            catalog.attributes_of(1),
            Err(Error::RowNotFound(1))
        ));
    }

    #[test]
    fn validate_rejects_row_count_mismatch() {
        let mut snap = snapshot();
        snap.combined_embeddings.pop();
        assert!(matches!(snap.validate(), Err(Error::Snapshot(_))));
    }

    #[test]
    fn validate_rejects_ragged_embeddings() {
        let mut snap = snapshot();
        snap.product_embeddings[1] = vec![1.0, 2.0, 3.0];
        assert!(matches!(snap.validate(), Err(Error::Snapshot(_))));
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.bin");

        snapshot().save(&path).unwrap();
        let loaded = CatalogSnapshot::load(&path).unwrap();

        assert_eq!(loaded.dimension, 2);
        assert_eq!(loaded.products, snapshot().products);
        assert_eq!(loaded.product_embeddings, snapshot().product_embeddings);
    }

    #[test]
    fn load_rejects_garbage_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.bin");
        fs::write(&path, b"not a snapshot").unwrap();
        assert!(matches!(
            CatalogSnapshot::load(&path),
            Err(Error::Snapshot(_))
        ));
    }
}
