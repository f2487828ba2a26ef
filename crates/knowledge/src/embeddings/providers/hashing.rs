//! Offline embedding provider using signed feature hashing.

use crate::embeddings::provider::EmbeddingProvider;
use docintel_core::AppResult;
use sha2::{Digest, Sha256};

/// Deterministic provider that needs no network.
///
/// Each lower-cased alphanumeric token is hashed with SHA-256 into one
/// dimension with a sign bit, and the result is L2-normalized. Texts that
/// share vocabulary get high cosine similarity, which is enough for local
/// runs and tests.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimensions: usize,
}

impl HashingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let lower = text.to_lowercase();
        for token in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let idx = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[idx] += sign;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashingProvider {
    fn provider_name(&self) -> &str {
        "hashing"
    }

    fn model_name(&self) -> &str {
        "sha256-hashing-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    #[tokio::test]
    async fn test_hashing_provider_normalized() {
        let provider = HashingProvider::new(128);
        let embedding = provider.embed("Revenue in 2023 was 4,034 million").await.unwrap();

        assert_eq!(embedding.len(), 128);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_hashing_provider_deterministic() {
        let provider = HashingProvider::new(128);
        let a = provider.embed("deterministic test").await.unwrap();
        let b = provider.embed("Deterministic  TEST").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let provider = HashingProvider::new(256);
        let query = provider.embed("annual revenue growth").await.unwrap();
        let related = provider
            .embed("The annual revenue showed strong growth")
            .await
            .unwrap();
        let unrelated = provider.embed("Pasta recipes with basil").await.unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = HashingProvider::new(32);
        let embedding = provider.embed("   ").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }
}
