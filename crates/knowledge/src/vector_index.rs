//! Vector index abstraction.
//!
//! Defines provider-agnostic traits for similarity search and for loading
//! documents into an index.

use crate::types::{IndexDocument, SearchHit};
use docintel_core::AppResult;

/// Trait for vector search backends.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name for logs (e.g. "azure", "local", "memory")
    fn backend_name(&self) -> &str;

    /// Search for the top-k hits most similar to `vector`.
    ///
    /// Returns hits ordered by descending score. Failures are reported as
    /// `AppError::Search`.
    async fn search(&self, vector: &[f32], k: usize) -> AppResult<Vec<SearchHit>>;
}

/// Trait for backends that accept uploaded documents.
#[async_trait::async_trait]
pub trait IndexWriter: Send + Sync {
    /// Upload a batch of documents, returning how many were accepted.
    async fn upload(&self, documents: &[IndexDocument]) -> AppResult<usize>;
}
