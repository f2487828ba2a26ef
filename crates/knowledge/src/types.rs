//! Core types for document retrieval.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A unit of extracted document text with its page metadata and embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: String,

    /// Index name of the document the text came from (e.g. "report.json")
    pub source_document: String,

    /// 1-based page number
    pub page: u32,

    /// Extracted text
    pub text: String,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

impl From<IndexDocument> for Chunk {
    fn from(doc: IndexDocument) -> Self {
        Self {
            id: doc.id,
            source_document: doc.source,
            page: doc.page,
            text: doc.text,
            embedding: doc.embedding,
        }
    }
}

/// One scored hit returned by a vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub source: String,
    pub page: u32,
    pub score: f32,
}

/// Filtered, deduplicated and ranked chunks for one query.
///
/// Chunks are ordered by non-increasing score. An empty result means no
/// relevant content was found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunks: Vec<SearchHit>,
}

impl RetrievalResult {
    pub fn new(chunks: Vec<SearchHit>) -> Self {
        Self { chunks }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Highest score, if any chunk survived.
    pub fn top_score(&self) -> Option<f32> {
        self.chunks.first().map(|c| c.score)
    }
}

/// A grouped reference to one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Human-readable document name
    pub display_name: String,

    /// Stored document file name (e.g. "annual-report.pdf")
    pub source_file: String,

    /// Pages the retrieved content came from, ascending
    pub pages: BTreeSet<u32>,

    /// Time-limited link to the document
    pub url: String,
}

impl Citation {
    /// Pages rendered as "2, 5".
    pub fn pages_label(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The final answer shown to the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text, or a placeholder describing why no answer was produced
    pub text: String,

    /// Source documents the answer was grounded on
    pub citations: Vec<Citation>,

    /// Non-fatal problems to show next to the answer
    pub notices: Vec<String>,
}

/// One page of a parsed document file (`<doc>.json` is an array of these).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page: u32,
    pub text: String,
}

/// Embedding written for one page (`<doc>.page<N>.embedding.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub embedding: Vec<f32>,
    pub text: String,
    pub source: String,
    pub page: u32,
}

/// Document uploaded into a search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub id: String,
    pub text: String,
    pub source: String,
    pub page: u32,
    pub embedding: Vec<f32>,
}

impl IndexDocument {
    /// Build an index document from an embedding record with a fresh UUID.
    pub fn from_record(record: EmbeddingRecord) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: record.text,
            source: record.source,
            page: record.page,
            embedding: record.embedding,
        }
    }
}
