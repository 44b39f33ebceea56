//! # Aisle (library root)
//!
//! Core plumbing for the **Aisle** conversational product-recommendation CLI:
//!
//! - Exact nearest-neighbor retrieval over catalog embeddings
//!   ([`vector_index`], [`catalog`]).
//! - The search → buffer → rerank conversation flow ([`engine`]).
//! - A crash-safe, content-addressed review-summary cache ([`summary_cache`]).
//! - Collaborator seams for the chat and embedding models ([`assistant`],
//!   [`embeddings`], [`prompts`]).
//! - CLI parsing and configuration ([`commands`], [`config`]).
//!
//! The retrieval core only ever consumes plain text and fixed-dimension
//! vectors; which models produce them is a configuration detail.
//!
//! ## Quick example
//! ```no_run
//! use aisle::engine::RecommendationEngine;
//! use aisle::summary_cache::SummaryCache;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = RecommendationEngine::load(Path::new("catalog.bin"))?;
//! let mut cache = SummaryCache::open("product_summaries.json");
//!
//! let query_embedding = vec![0.0f32; 1536]; // from your embedding service
//! let (shown, buffer) = engine.search(&query_embedding, 6, 30)?;
//! for rec in &shown {
//!     if let Some(summary) = cache.get(&rec.product_name) {
//!         println!("{} ({:.2}): {summary}", rec.product_name, rec.score);
//!     }
//! }
//!
//! // A follow-up turn narrows within the captured buffer.
//! let followup_embedding = vec![0.0f32; 1536];
//! let narrowed = engine.rerank(&followup_embedding, &buffer, 6)?;
//! # let _ = narrowed;
//! # Ok(()) }
//! ```

use directories::ProjectDirs;

pub mod assistant;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod prompts;
pub mod summary_cache;
pub mod vector_index;

pub use error::{Error, Result};

/// Return the per-platform configuration directory used by Aisle.
///
/// Uses [`directories::ProjectDirs`] with the application triple
/// `("com", "aisle", "aisle")`, so the right place is chosen on each OS
/// (e.g. `~/.config/aisle` on Linux via XDG).
///
/// The directory is **not** created by this function; callers that need it
/// should create it with `fs::create_dir_all`.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be
/// determined.
pub fn config_dir() -> std::result::Result<std::path::PathBuf, Box<dyn std::error::Error>> {
    let proj_dirs =
        ProjectDirs::from("com", "aisle", "aisle").ok_or("Unable to determine config directory")?;
    Ok(proj_dirs.config_dir().to_path_buf())
}
