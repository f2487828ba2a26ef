//! Retrieval-augmented answering.
//!
//! query → [`Retriever`] → [`AnswerComposer`] → [`CitationResolver`] → answer + links

pub mod citations;
pub mod composer;
pub mod pipeline;
pub mod retriever;
pub mod types;

pub use citations::{CitationResolution, CitationResolver, LinkFailure};
pub use composer::{build_context, AnswerComposer, CONTEXT_DELIMITER, MALFORMED_RESPONSE_TEXT};
pub use pipeline::{QueryOutcome, QueryPipeline};
pub use retriever::{normalize_text, select_chunks, word_count, Retriever};
pub use types::SourceNaming;
