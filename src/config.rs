//! Application configuration loading.
//!
//! Defines the [`AisleConfig`] struct and a [`load_config`] function that
//! reads it from a YAML file. The config names the chat and embedding
//! collaborators, the startup artifacts (catalog snapshot, summary cache
//! path), and the retrieval knobs (display size, buffer size, cache
//! retention).

use serde::{Deserialize, Serialize};
use std::{error::Error, fs};

/// Everything Aisle needs to run, loaded once at startup.
///
/// `buffer_k` deliberately exceeds `display_k`: the first turn captures a
/// candidate pool wider than what is shown, so follow-up turns can promote
/// products the user never saw.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct AisleConfig {
    /// API key for the OpenAI-compatible endpoint.
    pub api_key: String,

    /// Base URL of the OpenAI-compatible endpoint.
    pub api_base: String,

    /// Chat model used for intent rewriting, follow-ups, and summaries.
    pub model: String,

    /// Embedding model used for query embeddings.
    pub embedding_model: String,

    /// Dimensionality of the embedding model and of both indices.
    pub embedding_dimension: usize,

    /// Path to the catalog snapshot produced by the offline pipeline.
    pub snapshot_path: String,

    /// Path to the durable summary cache file.
    pub cache_path: String,

    /// Days a cached summary survives without being read.
    #[serde(default = "default_retention_days")]
    pub cache_retention_days: u32,

    /// Recommendations shown per turn.
    #[serde(default = "default_display_k")]
    pub display_k: usize,

    /// Candidates captured by the first-turn wide search.
    #[serde(default = "default_buffer_k")]
    pub buffer_k: usize,
}

fn default_retention_days() -> u32 {
    30
}

fn default_display_k() -> usize {
    6
}

fn default_buffer_k() -> usize {
    30
}

/// Loads the application's configuration from a YAML file.
///
/// # Errors
/// I/O failures reading the file, or YAML that does not deserialize into
/// [`AisleConfig`].
///
/// # Examples
/// ```no_run
/// use aisle::config::load_config;
///
/// let config = load_config("/path/to/config.yaml").unwrap();
/// println!("{:?}", config);
/// ```
pub fn load_config(file: &str) -> Result<AisleConfig, Box<dyn Error>> {
    let content = fs::read_to_string(file)?;
    let config: AisleConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_valid_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
api_key: "example_api_key"
api_base: "http://example.com/v1"
model: "gpt-4o-mini"
embedding_model: "text-embedding-3-small"
embedding_dimension: 1536
snapshot_path: "data/catalog.bin"
cache_path: "data/product_summaries.json"
cache_retention_days: 14
display_k: 4
buffer_k: 20
"#
        )
        .unwrap();

        let config = load_config(temp_file.path().to_str().unwrap());

        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.api_key, "example_api_key");
        assert_eq!(config.api_base, "http://example.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.embedding_model, "text-embedding-3-small");
        assert_eq!(config.embedding_dimension, 1536);
        assert_eq!(config.snapshot_path, "data/catalog.bin");
        assert_eq!(config.cache_retention_days, 14);
        assert_eq!(config.display_k, 4);
        assert_eq!(config.buffer_k, 20);
    }

    #[test]
    fn test_load_config_applies_retrieval_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
api_key: ""
api_base: "http://localhost:5001/v1"
model: "gpt-4o-mini"
embedding_model: "text-embedding-3-small"
embedding_dimension: 1536
snapshot_path: "data/catalog.bin"
cache_path: "data/product_summaries.json"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.display_k, 6);
        assert_eq!(config.buffer_k, 30);
        assert_eq!(config.cache_retention_days, 30);
    }

    #[test]
    fn test_load_config_invalid_file() {
        let config = load_config("non/existent/path");
        assert!(config.is_err());
    }

    #[test]
    fn test_load_config_invalid_format() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"invalid: config: format"#).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap());
        assert!(config.is_err());
    }
}
