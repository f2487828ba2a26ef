//! Document retrieval and grounded answering.
//!
//! Chunks of OCR'd document pages are embedded, stored in a vector index and
//! retrieved to ground LLM answers with page-level citations.

pub mod embeddings;
pub mod ingest;
pub mod links;
pub mod progress;
pub mod rag;
pub mod search;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use links::{create_link_factory, LinkFactory};
pub use rag::{
    AnswerComposer, CitationResolution, CitationResolver, QueryOutcome, QueryPipeline, Retriever,
    SourceNaming,
};
pub use search::{open_backend, SearchBackend};
pub use store::ChunkStore;
pub use types::{
    Answer, Chunk, Citation, EmbeddingRecord, IndexDocument, PageRecord, RetrievalResult,
    SearchHit,
};
pub use vector_index::{IndexWriter, VectorIndex};
