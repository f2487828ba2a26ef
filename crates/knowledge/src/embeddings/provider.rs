//! Embedding provider trait and factory.

use super::providers::{HashingProvider, OpenAiEmbeddingProvider};
use docintel_core::config::EmbeddingSettings;
use docintel_core::{AppError, AppResult};
use docintel_llm::ProviderType;
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "hashing", "openai", "azure-openai")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    settings: &EmbeddingSettings,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "hashing" | "mock" => Ok(Arc::new(HashingProvider::new(settings.dimensions))),

        name => {
            let provider = ProviderType::parse(name)
                .filter(|p| *p != ProviderType::Mock)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "Unknown embedding provider: '{}'. Supported providers: azure-openai, openai, hashing",
                        name
                    ))
                })?;

            let endpoint = match (provider, settings.endpoint.as_deref()) {
                (_, Some(endpoint)) => endpoint.to_string(),
                (ProviderType::OpenAi, None) => "https://api.openai.com/v1".to_string(),
                _ => {
                    return Err(AppError::Config(
                        "Azure OpenAI embeddings require an endpoint (embedding.endpoint or DOCINTEL_EMBEDDING_ENDPOINT)"
                            .to_string(),
                    ))
                }
            };

            let api_key = api_key.ok_or_else(|| {
                AppError::Config(format!(
                    "Embedding provider '{}' requires an API key in ${}",
                    name, settings.api_key_env
                ))
            })?;

            let client = OpenAiEmbeddingProvider::new(
                provider,
                &endpoint,
                api_key,
                &settings.model,
                settings.api_version.as_deref(),
                settings.dimensions,
                timeout,
            )?;
            Ok(Arc::new(client))
        }
    }
}
