//! Query retrieval: embed, search, filter, deduplicate, rank, truncate.

use crate::embeddings::{check_embedding, EmbeddingProvider};
use crate::types::{RetrievalResult, SearchHit};
use crate::vector_index::VectorIndex;
use docintel_core::config::RetrievalSettings;
use docintel_core::{AppError, AppResult};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Turns a question into the ranked chunks an answer should be grounded on.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Retrieve with the limits from configuration.
    pub async fn retrieve_with(
        &self,
        query: &str,
        limits: RetrievalSettings,
    ) -> AppResult<RetrievalResult> {
        self.retrieve(query, limits.k_search, limits.k_final, limits.min_words)
            .await
    }

    /// Retrieve at most `k_final` chunks out of the top `k_search` hits.
    ///
    /// An empty result is not an error: it means nothing relevant survived
    /// filtering. Embedding problems surface as `AppError::Embedding` and
    /// index problems as `AppError::Search`.
    #[instrument(skip(self, query), fields(backend = self.index.backend_name()))]
    pub async fn retrieve(
        &self,
        query: &str,
        k_search: usize,
        k_final: usize,
        min_words: usize,
    ) -> AppResult<RetrievalResult> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
        }
        if k_final < 1 {
            return Err(AppError::InvalidInput("k_final must be at least 1".to_string()));
        }
        if k_search < k_final {
            return Err(AppError::InvalidInput(format!(
                "k_search ({}) must be greater than or equal to k_final ({})",
                k_search, k_final
            )));
        }

        let vector = self.embedder.embed(query).await.map_err(|e| match e {
            AppError::Embedding(_) => e,
            other => AppError::Embedding(other.to_string()),
        })?;
        check_embedding(&vector, self.embedder.dimensions())?;

        let hits = self.index.search(&vector, k_search).await.map_err(|e| match e {
            AppError::Search(_) => e,
            other => AppError::Search(other.to_string()),
        })?;

        debug!("Search returned {} hits", hits.len());

        let result = select_chunks(hits, k_final, min_words);

        match result.top_score() {
            Some(top) => info!(
                "Retrieved {} chunks (top score: {:.3})",
                result.len(),
                top
            ),
            None => info!("No relevant chunks survived filtering"),
        }

        Ok(result)
    }
}

/// Filter, deduplicate, rank and truncate raw search hits.
///
/// Hits are dropped when their trimmed text is empty, shorter than
/// `min_words` words, or equal after normalization to a hit kept earlier.
/// Survivors are stably sorted by descending score.
pub fn select_chunks(hits: Vec<SearchHit>, k_final: usize, min_words: usize) -> RetrievalResult {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for hit in hits {
        let trimmed = hit.text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if word_count(trimmed) < min_words {
            debug!("Dropping short chunk {} ({} words)", hit.id, word_count(trimmed));
            continue;
        }
        if !hit.score.is_finite() {
            debug!("Dropping chunk {} with non-finite score", hit.id);
            continue;
        }
        if !seen.insert(normalize_text(trimmed)) {
            debug!("Dropping duplicate chunk {}", hit.id);
            continue;
        }
        kept.push(hit);
    }

    kept.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    kept.truncate(k_final);

    RetrievalResult::new(kept)
}

/// Whitespace-separated token count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Dedup key: trimmed, whitespace runs collapsed, lower-cased.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, text: &str, score: f32) -> SearchHit {
        SearchHit {
            id: id.to_string(),
            text: text.to_string(),
            source: "report.json".to_string(),
            page: 1,
            score,
        }
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Revenue\n\tGrew   FAST "), "revenue grew fast");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("one two  three\nfour"), 4);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn test_select_drops_short_and_empty() {
        let result = select_chunks(
            vec![
                hit("a", "   ", 0.9),
                hit("b", "too short", 0.8),
                hit("c", "long enough text here", 0.7),
            ],
            4,
            3,
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result.chunks[0].id, "c");
    }

    #[test]
    fn test_select_keeps_first_duplicate() {
        let result = select_chunks(
            vec![
                hit("first", "Revenue grew in 2023", 0.5),
                hit("second", "revenue  grew in 2023 ", 0.9),
            ],
            4,
            1,
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result.chunks[0].id, "first");
    }

    #[test]
    fn test_select_stable_for_ties() {
        let result = select_chunks(
            vec![
                hit("x", "alpha beta", 0.5),
                hit("y", "gamma delta", 0.9),
                hit("z", "epsilon zeta", 0.5),
            ],
            4,
            1,
        );
        let ids: Vec<_> = result.chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["y", "x", "z"]);
    }

    #[test]
    fn test_select_min_words_zero_keeps_nonempty() {
        let result = select_chunks(vec![hit("a", "word", 0.1), hit("b", "", 0.2)], 4, 0);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_select_drops_nan_scores() {
        let result = select_chunks(
            vec![hit("a", "some text", f32::NAN), hit("b", "other text", 0.2)],
            4,
            1,
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result.chunks[0].id, "b");
    }
}
