//! In-memory chunk store.
//!
//! Holds chunks with their embeddings and answers similarity queries by
//! brute-force cosine scoring. Used for the `memory` search backend and in
//! tests.

use crate::embeddings::cosine_similarity;
use crate::types::{Chunk, IndexDocument, SearchHit};
use crate::vector_index::{IndexWriter, VectorIndex};
use docintel_core::{AppError, AppResult};
use tokio::sync::RwLock;

/// In-memory set of chunks that can serve as a vector index.
#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: RwLock<Vec<Chunk>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing chunks.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks: RwLock::new(chunks),
        }
    }

    /// Build a store from index documents.
    pub fn from_documents(documents: Vec<IndexDocument>) -> Self {
        Self::from_chunks(documents.into_iter().map(Chunk::from).collect())
    }

    /// Add one chunk, replacing any chunk with the same ID.
    pub async fn insert(&self, chunk: Chunk) {
        let mut chunks = self.chunks.write().await;
        match chunks.iter_mut().find(|c| c.id == chunk.id) {
            Some(existing) => *existing = chunk,
            None => chunks.push(chunk),
        }
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }

    /// Look a chunk up by ID.
    pub async fn get(&self, id: &str) -> Option<Chunk> {
        self.chunks.read().await.iter().find(|c| c.id == id).cloned()
    }
}

#[async_trait::async_trait]
impl VectorIndex for ChunkStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn search(&self, vector: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        let chunks = self.chunks.read().await;

        let mut hits = Vec::with_capacity(chunks.len());
        for chunk in chunks.iter() {
            if chunk.embedding.len() != vector.len() {
                return Err(AppError::Search(format!(
                    "Chunk {} has dimension {}, query has {}",
                    chunk.id,
                    chunk.embedding.len(),
                    vector.len()
                )));
            }

            hits.push(SearchHit {
                id: chunk.id.clone(),
                text: chunk.text.clone(),
                source: chunk.source_document.clone(),
                page: chunk.page,
                score: cosine_similarity(vector, &chunk.embedding),
            });
        }

        // Stable: equal scores keep insertion order
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        Ok(hits)
    }
}

#[async_trait::async_trait]
impl IndexWriter for ChunkStore {
    async fn upload(&self, documents: &[IndexDocument]) -> AppResult<usize> {
        for doc in documents {
            self.insert(Chunk::from(doc.clone())).await;
        }
        Ok(documents.len())
    }
}
