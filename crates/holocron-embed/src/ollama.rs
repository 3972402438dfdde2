//! Ollama HTTP embedding provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use holocron_core::{Embedder, HolocronError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Embedder backed by an Ollama server's `/api/embed` endpoint.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Newer servers return `embeddings` (batched); older ones `embedding`.
#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// Create an embedder against the given base URL and model.
    ///
    /// `dimensions` must match what the model actually produces; the store
    /// locks its vector width on first insert.
    pub fn new(base_url: &str, model: &str, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                HolocronError::embedder(format!(
                    "Ollama request failed: {}. Is the server running at {}?",
                    e, self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(HolocronError::embedder(format!(
                "Ollama embedding request failed (HTTP {}): {}",
                status, detail
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| HolocronError::embedder(format!("Unexpected Ollama response: {}", e)))?;

        let vector = parsed
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .or_else(|| (!parsed.embedding.is_empty()).then_some(parsed.embedding))
            .ok_or_else(|| HolocronError::embedder("Ollama returned no embedding"))?;

        debug!(width = vector.len(), model = %self.model, "embedded text");
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}
