//! Hosted embedding provider for the OpenAI `/embeddings` API.
//!
//! Works against both Azure OpenAI deployments (`api-key` header, `api-version`
//! query parameter, endpoint ending in `/openai/deployments/<name>`) and
//! OpenAI-compatible servers (bearer token).

use crate::embeddings::{check_embedding, EmbeddingProvider};
use async_trait::async_trait;
use docintel_core::{AppError, AppResult};
use docintel_llm::ProviderType;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Embedding provider backed by an OpenAI-style REST endpoint.
#[derive(Clone)]
pub struct OpenAiEmbeddingProvider {
    client: Client,
    provider: ProviderType,
    url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl std::fmt::Debug for OpenAiEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddingProvider")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl OpenAiEmbeddingProvider {
    /// Create a provider.
    ///
    /// `api_version` is appended as the `api-version` query parameter when set.
    pub fn new(
        provider: ProviderType,
        endpoint: &str,
        api_key: &str,
        model: &str,
        api_version: Option<&str>,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let mut url = format!("{}/embeddings", endpoint.trim_end_matches('/'));
        if let Some(version) = api_version {
            url.push_str("?api-version=");
            url.push_str(version);
        }

        Ok(Self {
            client,
            provider,
            url,
            api_key: api_key.to_string(),
            model: model.to_string(),
            dimensions,
        })
    }

    /// Parse a successful response body into vectors in input order.
    fn parse_response(&self, body: &str, expected: usize) -> AppResult<Vec<Vec<f32>>> {
        let response: EmbeddingResponse = serde_json::from_str(body)
            .map_err(|e| AppError::Embedding(format!("Invalid embedding response: {}", e)))?;

        if response.data.len() != expected {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                response.data.len()
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|d| d.index.unwrap_or(0));

        let vectors: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
        for vector in &vectors {
            check_embedding(vector, self.dimensions)?;
        }

        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn provider_name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        debug!("Sending embedding request to {}", self.url);

        let builder = self.client.post(&self.url).json(&request);
        let response = self
            .provider
            .authorize(builder, Some(self.api_key.as_str()))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Embedding(format!("Embedding request timed out: {}", e))
                } else {
                    AppError::Embedding(format!("Failed to send embedding request: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to read embedding response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::Embedding(format!(
                "Embedding request failed: {} - {}",
                status.as_u16(),
                body
            )));
        }

        self.parse_response(&body, texts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(dimensions: usize) -> OpenAiEmbeddingProvider {
        OpenAiEmbeddingProvider::new(
            ProviderType::AzureOpenAi,
            "https://example.openai.azure.com/openai/deployments/embed/",
            "key",
            "text-embedding-ada-002",
            Some("2023-05-15"),
            dimensions,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_url_includes_api_version() {
        let p = provider(3);
        assert_eq!(
            p.url,
            "https://example.openai.azure.com/openai/deployments/embed/embeddings?api-version=2023-05-15"
        );
        assert!(!format!("{:?}", p).contains("api_key"));
    }

    #[test]
    fn test_parse_response_orders_by_index() {
        let body = r#"{"data": [
            {"index": 1, "embedding": [0.0, 1.0, 0.0]},
            {"index": 0, "embedding": [1.0, 0.0, 0.0]}
        ]}"#;
        let vectors = provider(3).parse_response(body, 2).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_parse_response_rejects_wrong_dimension() {
        let body = r#"{"data": [{"index": 0, "embedding": [1.0, 0.0]}]}"#;
        let result = provider(3).parse_response(body, 1);
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[test]
    fn test_parse_response_rejects_missing_data() {
        let result = provider(3).parse_response(r#"{"error": "nope"}"#, 1);
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_embedding_failure() {
        let p = OpenAiEmbeddingProvider::new(
            ProviderType::OpenAi,
            "http://127.0.0.1:9",
            "key",
            "m",
            None,
            3,
            Duration::from_secs(2),
        )
        .unwrap();

        let result = p.embed("hello").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }
}
