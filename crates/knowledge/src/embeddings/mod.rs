//! Embedding generation.
//!
//! Provider-agnostic text-to-vector conversion, plus a guard that checks
//! vectors against the configured dimension.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{HashingProvider, OpenAiEmbeddingProvider};

use docintel_core::{AppError, AppResult};

/// Check that a vector has the expected dimension and finite components.
pub fn check_embedding(vector: &[f32], expected_dim: usize) -> AppResult<()> {
    if vector.len() != expected_dim {
        return Err(AppError::Embedding(format!(
            "Embedding dimension mismatch: expected {}, got {}",
            expected_dim,
            vector.len()
        )));
    }

    if vector.iter().any(|v| !v.is_finite()) {
        return Err(AppError::Embedding(
            "Embedding contains non-finite values".to_string(),
        ));
    }

    Ok(())
}

/// Cosine similarity between two vectors; 0.0 for mismatched or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
