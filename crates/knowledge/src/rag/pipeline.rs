//! End-to-end query flow: retrieve, compose, cite.

use crate::rag::citations::CitationResolver;
use crate::rag::composer::AnswerComposer;
use crate::rag::retriever::Retriever;
use crate::types::{Answer, RetrievalResult};
use docintel_core::config::RetrievalSettings;
use docintel_core::AppResult;
use serde::Serialize;
use tracing::{info, instrument};

/// Terminal state of one query.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Nothing relevant survived retrieval; no answer was composed
    NoRelevantContent,
    /// An answer (possibly a placeholder) with its citations
    Answered {
        answer: Answer,
        retrieval: RetrievalResult,
    },
}

/// Wires the retriever, composer and citation resolver together.
#[derive(Clone)]
pub struct QueryPipeline {
    retriever: Retriever,
    composer: AnswerComposer,
    citations: CitationResolver,
    limits: RetrievalSettings,
}

impl QueryPipeline {
    pub fn new(
        retriever: Retriever,
        composer: AnswerComposer,
        citations: CitationResolver,
        limits: RetrievalSettings,
    ) -> Self {
        Self {
            retriever,
            composer,
            citations,
            limits,
        }
    }

    /// Answer a question.
    ///
    /// Embedding and search failures abort with an error. Completion and link
    /// failures never do; they show up in `Answer::text` and `Answer::notices`.
    #[instrument(skip(self, query))]
    pub async fn ask(&self, query: &str) -> AppResult<QueryOutcome> {
        let retrieval = self.retriever.retrieve_with(query, self.limits).await?;

        if retrieval.is_empty() {
            info!("No relevant content for query");
            return Ok(QueryOutcome::NoRelevantContent);
        }

        let mut answer = self.composer.compose(query, &retrieval).await;

        let resolution = self.citations.resolve(&retrieval).await;
        answer.citations = resolution.citations;
        answer.notices.extend(
            resolution
                .failures
                .into_iter()
                .map(|f| format!("Could not link {}: {}", f.source, f.message)),
        );

        Ok(QueryOutcome::Answered { answer, retrieval })
    }
}
