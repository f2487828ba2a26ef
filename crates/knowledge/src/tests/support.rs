//! Scripted capability fakes for pipeline tests.

use crate::embeddings::EmbeddingProvider;
use crate::links::LinkFactory;
use crate::types::SearchHit;
use crate::vector_index::VectorIndex;
use docintel_core::{AppError, AppResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Returns the same vector for every text, or fails.
#[derive(Debug)]
pub struct FixedEmbedder {
    pub vector: Vec<f32>,
    pub dimensions: usize,
    pub fail: bool,
}

impl FixedEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            vector: vec![0.5; dimensions],
            dimensions,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(4)
        }
    }

    /// Claims `dimensions` but returns vectors of another length.
    pub fn wrong_dimension() -> Self {
        Self {
            vector: vec![0.5; 3],
            dimensions: 4,
            fail: false,
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if self.fail {
            return Err(AppError::Embedding("model unavailable".to_string()));
        }
        Ok(texts.iter().map(|_| self.vector.clone()).collect())
    }
}

/// Returns scripted hits in the given order.
pub struct ScriptedIndex {
    hits: Vec<SearchHit>,
    fail: bool,
    searches: AtomicUsize,
    last_k: AtomicUsize,
}

impl ScriptedIndex {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            fail: false,
            searches: AtomicUsize::new(0),
            last_k: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn last_k(&self) -> usize {
        self.last_k.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl VectorIndex for ScriptedIndex {
    fn backend_name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, _vector: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.last_k.store(k, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Search("index offline".to_string()));
        }
        Ok(self.hits.iter().take(k).cloned().collect())
    }
}

/// Deterministic links; files listed in `missing` fail.
#[derive(Default)]
pub struct RecordingLinks {
    pub missing: HashSet<String>,
    pub requests: Mutex<Vec<(String, String, u32)>>,
}

impl RecordingLinks {
    pub fn missing(files: &[&str]) -> Self {
        Self {
            missing: files.iter().map(|f| f.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, String, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LinkFactory for RecordingLinks {
    async fn make_link(&self, container: &str, file_name: &str, ttl_minutes: u32) -> AppResult<String> {
        self.requests.lock().unwrap().push((
            container.to_string(),
            file_name.to_string(),
            ttl_minutes,
        ));

        if self.missing.contains(file_name) {
            return Err(AppError::LinkGeneration(format!("{} not found", file_name)));
        }
        Ok(format!("https://links.test/{}/{}?ttl={}", container, file_name, ttl_minutes))
    }
}

/// A hit with the given text.
pub fn hit(id: &str, text: &str, source: &str, page: u32, score: f32) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        text: text.to_string(),
        source: source.to_string(),
        page,
        score,
    }
}

/// A passage of at least 30 words that starts with `topic`.
pub fn long_text(topic: &str) -> String {
    format!("{} {}", topic, "the figures were reported in the annual filing ".repeat(4))
}
