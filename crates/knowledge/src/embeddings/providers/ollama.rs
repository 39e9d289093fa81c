//! Ollama embedding provider.
//!
//! Calls Ollama's local `/api/embeddings` endpoint with a model such as
//! `nomic-embed-text`. Requests are sent one text at a time; Ollama has no
//! batch endpoint.

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docgate_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider for `model`.
    ///
    /// The endpoint falls back to `OLLAMA_URL`, then to localhost. No request
    /// is made until the first embedding.
    pub fn new(endpoint: Option<&str>, model: &str, dimensions: usize) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Embedding(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let base_url = endpoint
            .map(str::to_string)
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
        })
    }

    /// Check a response vector against the configured dimension.
    fn check_dimensions(&self, embedding: Vec<f32>) -> AppResult<Vec<f32>> {
        if embedding.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Unexpected embedding dimensions: got {}, expected {}",
                embedding.len(),
                self.dimensions
            )));
        }
        Ok(embedding)
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);

            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        debug!("Generated {} dimensional embedding", body.embedding.len());

        self.check_dimensions(body.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama"))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            if text.trim().is_empty() {
                return Err(AppError::Embedding("Cannot embed empty text".to_string()));
            }
            embeddings.push(self.embed_single(text).await?);
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OllamaProvider {
        OllamaProvider::new(Some("http://127.0.0.1:9/"), "nomic-embed-text", 768).unwrap()
    }

    #[test]
    fn test_endpoint_and_identity() {
        let provider = provider();
        assert_eq!(provider.base_url, "http://127.0.0.1:9");
        assert_eq!(provider.model_name(), "nomic-embed-text");
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_dimension_mismatch_is_embedding_error() {
        let err = provider().check_dimensions(vec![0.0; 384]).unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(err.to_string().contains("expected 768"));
    }

    #[tokio::test]
    async fn test_empty_text_rejected_without_request() {
        let result = provider().embed("   ").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_embedding_error() {
        let result = provider().embed("vacation policy").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }
}
