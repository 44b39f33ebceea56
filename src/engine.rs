//! # Recommendation engine
//!
//! Composes the two vector indices and the catalog into the conversational
//! retrieval flow: a **fresh** query runs a wide top-K search over the
//! product-only index and captures the results as a candidate buffer; every
//! **follow-up** narrows within that buffer by rescoring the original
//! candidates against the follow-up embedding, never re-searching the full
//! catalog.
//!
//! A conversation is a two-state machine ([`SessionState`]): `Fresh` (no
//! buffer) and `Buffered` (buffer captured). [`RecommendationEngine::rerank`]
//! takes the buffer by shared reference, so reranking without a buffer is
//! unrepresentable and no rerank can mutate the pool it draws from. Follow-up
//! turns are therefore independent, order-insensitive refinements of the same
//! fixed candidate set.
//!
//! ## Scoring conventions
//! - First search: relative distance scores from
//!   [`similarity_scores`](crate::vector_index::similarity_scores), in [0, 1]
//!   within one result set.
//! - Rerank: cosine similarity between the follow-up embedding and each
//!   candidate's stored combined-index vector, in [-1, 1].
//!
//! Scores are comparable within one turn's output only.

use serde::Serialize;
use std::path::Path;
use tracing::warn;

use crate::catalog::{Catalog, CatalogSnapshot, Product};
use crate::error::{Error, Result};
use crate::vector_index::{VectorIndex, cosine_similarity, similarity_scores};

/// One recommended product, scored for a single turn's display.
///
/// Carries everything the caller needs to render a card and to feed the
/// summary pipeline, so downstream code never reaches back into the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// External product identity.
    pub product_name: String,
    /// Similarity score for this turn; higher is better.
    pub score: f32,
    /// Review titles attached to the product.
    pub review_titles: Vec<String>,
    /// Review bodies attached to the product.
    pub review_texts: Vec<String>,
    /// Product image reference.
    pub image_ref: String,
    /// Average review rating, 0.0–5.0.
    pub rating: f32,
}

impl Recommendation {
    fn from_product(product: &Product, score: f32) -> Self {
        Self {
            product_name: product.name.clone(),
            score,
            review_titles: product.review_titles.clone(),
            review_texts: product.review_texts.clone(),
            image_ref: product.image_ref.clone(),
            rating: product.rating,
        }
    }
}

/// The candidate pool captured by a first-turn wide search.
///
/// Ordered by that search's ranking. Read-only thereafter: reranks only read
/// it, and a brand-new query replaces it wholesale. Never persisted.
#[derive(Debug, Clone)]
pub struct CandidateBuffer {
    items: Vec<Recommendation>,
}

impl CandidateBuffer {
    /// Buffered candidates in original capture order.
    pub fn items(&self) -> &[Recommendation] {
        &self.items
    }

    /// Number of buffered candidates.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` when the buffer holds no candidates.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Product names in the buffer, in capture order.
    pub fn product_names(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.product_name.as_str()).collect()
    }
}

/// Conversation state: either no candidate pool yet, or one captured buffer.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No prior search this conversation.
    #[default]
    Fresh,
    /// A wide search ran; follow-ups narrow within this buffer.
    Buffered(CandidateBuffer),
}

impl SessionState {
    /// The captured buffer, when in the `Buffered` state.
    pub fn buffer(&self) -> Option<&CandidateBuffer> {
        match self {
            SessionState::Fresh => None,
            SessionState::Buffered(buffer) => Some(buffer),
        }
    }

    /// Capture a fresh buffer, replacing any previous one.
    pub fn capture(&mut self, buffer: CandidateBuffer) {
        *self = SessionState::Buffered(buffer);
    }

    /// Clear the buffer and return to `Fresh`.
    pub fn reset(&mut self) {
        *self = SessionState::Fresh;
    }
}

/// Shape statistics for the loaded catalog and indices.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_products: usize,
    pub product_index_dimension: usize,
    pub combined_index_dimension: usize,
}

/// Process-wide retrieval engine: catalog plus both indices, read-only after
/// construction and safe to share across sessions.
pub struct RecommendationEngine {
    catalog: Catalog,
    product_index: VectorIndex,
    combined_index: VectorIndex,
}

impl RecommendationEngine {
    /// Build the engine from an in-memory snapshot.
    ///
    /// # Errors
    /// [`Error::Snapshot`] when rows and embeddings are misaligned; index
    /// build failures surface as [`Error::DimensionMismatch`] or
    /// [`Error::Index`]. All of these must abort initialization.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self> {
        snapshot.validate()?;
        let product_index = VectorIndex::build(snapshot.dimension, snapshot.product_embeddings)?;
        let combined_index = VectorIndex::build(snapshot.dimension, snapshot.combined_embeddings)?;
        let catalog = Catalog::from_products(snapshot.products);

        Ok(Self {
            catalog,
            product_index,
            combined_index,
        })
    }

    /// Load the startup snapshot from disk and build the engine.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_snapshot(CatalogSnapshot::load(path)?)
    }

    /// Fresh top-K search over the product-only index.
    ///
    /// Runs a wide search with `k = buffer_k`, materializes every hit through
    /// the catalog, and returns the first `display_k` alongside the full
    /// buffer for the session to capture. Decoupling buffer capture from
    /// display size lets follow-ups rerank among a wider pool than was ever
    /// shown.
    ///
    /// # Returns
    /// `(shown, buffer)`: `shown` is the display slice, ordered by descending
    /// similarity; `buffer` holds all `buffer_k` candidates in that order.
    ///
    /// # Errors
    /// [`Error::EmptyIndex`] or [`Error::DimensionMismatch`] from the index.
    pub fn search(
        &self,
        query_embedding: &[f32],
        display_k: usize,
        buffer_k: usize,
    ) -> Result<(Vec<Recommendation>, CandidateBuffer)> {
        let hits = self.product_index.search(query_embedding, buffer_k)?;
        let distances: Vec<f32> = hits.iter().map(|&(_, d)| d).collect();
        let scores = similarity_scores(&distances);

        let mut items = Vec::with_capacity(hits.len());
        for (&(row_id, _), &score) in hits.iter().zip(scores.iter()) {
            let product = self.catalog.attributes_of(row_id)?;
            items.push(Recommendation::from_product(product, score));
        }

        let buffer = CandidateBuffer { items };
        let shown = buffer.items[..display_k.min(buffer.len())].to_vec();
        Ok((shown, buffer))
    }

    /// Rescore the buffered candidates against a follow-up embedding.
    ///
    /// Each candidate's name is resolved back to its row and its
    /// combined-index vector reconstructed; candidates that fail either step
    /// are dropped with a warning rather than aborting the turn. Scores are
    /// cosine similarities against the *original* stored vectors, so repeated
    /// reranks are independent evaluations over the same fixed pool.
    ///
    /// If no candidate resolves, the unmodified buffer is returned truncated
    /// to `display_k` instead of failing the turn.
    ///
    /// # Errors
    /// [`Error::DimensionMismatch`] when the follow-up embedding does not
    /// match the combined index dimensionality.
    pub fn rerank(
        &self,
        followup_embedding: &[f32],
        buffer: &CandidateBuffer,
        display_k: usize,
    ) -> Result<Vec<Recommendation>> {
        if followup_embedding.len() != self.combined_index.dimension() {
            return Err(Error::DimensionMismatch {
                expected: self.combined_index.dimension(),
                got: followup_embedding.len(),
            });
        }

        let mut rescored = Vec::with_capacity(buffer.len());
        for candidate in buffer.items() {
            let row_id = match self.catalog.row_of(&candidate.product_name) {
                Ok(row_id) => row_id,
                Err(e) => {
                    warn!(product = %candidate.product_name, "dropping candidate from rerank: {e}");
                    continue;
                }
            };
            let vector = match self.combined_index.reconstruct(row_id) {
                Ok(vector) => vector,
                Err(e) => {
                    warn!(product = %candidate.product_name, "dropping candidate from rerank: {e}");
                    continue;
                }
            };
            let mut rec = candidate.clone();
            rec.score = cosine_similarity(followup_embedding, vector);
            rescored.push(rec);
        }

        if rescored.is_empty() {
            return Ok(buffer.items().iter().take(display_k).cloned().collect());
        }

        rescored.sort_by(|a, b| b.score.total_cmp(&a.score));
        rescored.truncate(display_k);
        Ok(rescored)
    }

    /// Products most similar to a given product, via the combined index.
    ///
    /// The product itself is excluded from the results.
    ///
    /// # Errors
    /// [`Error::UnknownProduct`] for an unrecognized name; index errors as in
    /// [`search`](Self::search).
    pub fn similar_to(&self, product_name: &str, k: usize) -> Result<Vec<Recommendation>> {
        let row_id = self.catalog.row_of(product_name)?;
        let query = self.combined_index.reconstruct(row_id)?.to_vec();

        let hits: Vec<(usize, f32)> = self
            .combined_index
            .search(&query, k + 1)?
            .into_iter()
            .filter(|&(hit_row, _)| hit_row != row_id)
            .take(k)
            .collect();
        let distances: Vec<f32> = hits.iter().map(|&(_, d)| d).collect();
        let scores = similarity_scores(&distances);

        let mut similar = Vec::with_capacity(hits.len());
        for (&(hit_row, _), &score) in hits.iter().zip(scores.iter()) {
            let product = self.catalog.attributes_of(hit_row)?;
            similar.push(Recommendation::from_product(product, score));
        }
        Ok(similar)
    }

    /// Row count and index dimensionalities of the loaded artifacts.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_products: self.catalog.len(),
            product_index_dimension: self.product_index.dimension(),
            combined_index_dimension: self.combined_index.dimension(),
        }
    }

    /// The engine's read-only catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}
