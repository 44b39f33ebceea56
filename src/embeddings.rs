//! Embeddings client for OpenAI-compatible endpoints.
//!
//! Turns query text into the fixed-dimension vectors the retrieval core
//! consumes. The core never talks to the network itself; this client is the
//! collaborator seam, and it enforces the one contract the indices care
//! about: the returned vector's dimensionality must match the configured
//! index dimensionality exactly — no implicit resizing or padding.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Async embeddings client bound to one model and one dimensionality.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

impl EmbeddingClient {
    /// Build a client for the `/embeddings` endpoint under `api_base`.
    ///
    /// # Errors
    /// [`Error::Embedding`] when the key is not a valid header value or the
    /// HTTP client cannot be constructed.
    pub fn new(api_key: &str, api_base: &str, model: &str, dimension: usize) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|e| Error::Embedding(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Embedding(e.to_string()))?;
        let endpoint = format!("{}/embeddings", api_base.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
            dimension,
        })
    }

    /// Embed one query string.
    ///
    /// # Errors
    /// [`Error::Embedding`] on transport/API failures or an empty response,
    /// [`Error::DimensionMismatch`] when the vector length differs from the
    /// configured dimensionality.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: vec![text],
        };
        debug!(model = %self.model, "requesting query embedding");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Embedding(format!(
                "request failed ({status}): {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;
        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| Error::Embedding("response carried no embeddings".to_string()))?;

        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        Ok(vector)
    }

    /// Dimensionality this client promises to return.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn embedding_body(vector: &[f32]) -> serde_json::Value {
        json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": vector }],
            "model": "text-embedding-3-small",
            "usage": { "prompt_tokens": 5, "total_tokens": 5 }
        })
    }

    #[tokio::test]
    async fn embeds_against_a_mock_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(embedding_body(&[0.1, 0.2, 0.3]));
            })
            .await;

        let client = EmbeddingClient::new("test-key", &server.base_url(), "m", 3).unwrap();
        let vector = client.embed("linen shirts").await.unwrap();

        mock.assert_async().await;
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn rejects_vectors_of_the_wrong_dimension() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(embedding_body(&[0.1, 0.2]));
            })
            .await;

        let client = EmbeddingClient::new("test-key", &server.base_url(), "m", 3).unwrap();
        assert!(matches!(
            client.embed("linen shirts").await,
            Err(Error::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[tokio::test]
    async fn surfaces_api_failures_as_embedding_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(429).body("rate limited");
            })
            .await;

        let client = EmbeddingClient::new("test-key", &server.base_url(), "m", 3).unwrap();
        assert!(matches!(
            client.embed("linen shirts").await,
            Err(Error::Embedding(_))
        ));
    }
}
