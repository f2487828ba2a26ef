//! End-to-end answering through the query pipeline with scripted capabilities.

use super::support::{hit, long_text, FixedEmbedder, RecordingLinks, ScriptedIndex};
use crate::rag::{AnswerComposer, CitationResolver, QueryOutcome, QueryPipeline, Retriever, SourceNaming};
use crate::types::SearchHit;
use docintel_core::config::RetrievalSettings;
use docintel_llm::{CompletionResponse, MockCompletionClient};
use docintel_prompt::grounded_answer_prompt;
use std::sync::Arc;

const LIMITS: RetrievalSettings = RetrievalSettings {
    k_search: 10,
    k_final: 4,
    min_words: 30,
};

fn pipeline(
    hits: Vec<SearchHit>,
    completion: Arc<MockCompletionClient>,
    links: Arc<RecordingLinks>,
) -> QueryPipeline {
    let retriever = Retriever::new(
        Arc::new(FixedEmbedder::new(4)),
        Arc::new(ScriptedIndex::new(hits)),
    );
    let composer = AnswerComposer::new(completion, grounded_answer_prompt()).unwrap();
    let citations = CitationResolver::new(links, SourceNaming::default(), "documents", 60);
    QueryPipeline::new(retriever, composer, citations, LIMITS)
}

fn answered(outcome: QueryOutcome) -> crate::types::Answer {
    match outcome {
        QueryOutcome::Answered { answer, .. } => answer,
        QueryOutcome::NoRelevantContent => panic!("expected an answer"),
    }
}

#[tokio::test]
async fn test_answer_cites_pages_of_one_document() {
    let completion = Arc::new(MockCompletionClient::answering(
        "Revenue was 4,034 million (Source: report.pdf, Page: 2).",
    ));
    let links = Arc::new(RecordingLinks::default());
    let hits = vec![
        hit("a", &long_text("Net income"), "report.json", 5, 0.9),
        hit("b", &long_text("Revenue"), "report.json", 2, 0.8),
    ];

    let outcome = pipeline(hits, completion.clone(), links.clone())
        .ask("What was the revenue?")
        .await
        .unwrap();
    let answer = answered(outcome);

    assert_eq!(answer.text, "Revenue was 4,034 million (Source: report.pdf, Page: 2).");
    assert!(answer.notices.is_empty());
    assert_eq!(answer.citations.len(), 1);

    let citation = &answer.citations[0];
    assert_eq!(citation.source_file, "report.pdf");
    assert_eq!(citation.display_name, "report");
    assert_eq!(citation.pages.iter().copied().collect::<Vec<_>>(), vec![2, 5]);
    assert_eq!(citation.url, "https://links.test/documents/report.pdf?ttl=60");

    assert_eq!(
        links.requests(),
        vec![("documents".to_string(), "report.pdf".to_string(), 60)]
    );
    assert_eq!(completion.calls(), 1);
}

#[tokio::test]
async fn test_prompt_carries_question_and_context() {
    let completion = Arc::new(MockCompletionClient::answering("ok"));
    let hits = vec![hit("a", &long_text("Revenue"), "report.json", 2, 0.8)];

    pipeline(hits, completion.clone(), Arc::new(RecordingLinks::default()))
        .ask("What was the revenue?")
        .await
        .unwrap();

    let request = completion.last_request().unwrap();
    assert_eq!(request.messages.len(), 2);
    let user = &request.messages[1].content;
    assert!(user.contains("What was the revenue?"));
    assert!(user.contains("(Source: report.pdf, Page: 2)"));
    assert!(!user.contains("report.json"));
}

#[tokio::test]
async fn test_server_error_becomes_placeholder_with_citations() {
    let completion = Arc::new(MockCompletionClient::with_response(CompletionResponse::new(
        500,
        "internal error",
    )));
    let hits = vec![hit("a", &long_text("Revenue"), "report.json", 2, 0.8)];

    let answer = answered(
        pipeline(hits, completion, Arc::new(RecordingLinks::default()))
            .ask("What was the revenue?")
            .await
            .unwrap(),
    );

    assert!(answer.text.starts_with("Request failed: 500"));
    assert!(answer.text.contains("internal error"));
    assert_eq!(answer.notices.len(), 1);
    assert_eq!(answer.citations.len(), 1);
    assert_eq!(answer.citations[0].source_file, "report.pdf");
}

#[tokio::test]
async fn test_no_relevant_content_skips_completion() {
    let completion = Arc::new(MockCompletionClient::answering("unused"));
    let links = Arc::new(RecordingLinks::default());

    let outcome = pipeline(
        vec![hit("a", "too short", "report.json", 1, 0.9)],
        completion.clone(),
        links.clone(),
    )
    .ask("What was the revenue?")
    .await
    .unwrap();

    assert!(matches!(outcome, QueryOutcome::NoRelevantContent));
    assert_eq!(completion.calls(), 0);
    assert!(links.requests().is_empty());
}

#[tokio::test]
async fn test_link_failure_only_drops_that_source() {
    let completion = Arc::new(MockCompletionClient::answering("answer"));
    let links = Arc::new(RecordingLinks::missing(&["missing.pdf"]));
    let hits = vec![
        hit("a", &long_text("Dividends"), "summary.json", 3, 0.9),
        hit("b", &long_text("Revenue"), "missing.json", 1, 0.85),
        hit("c", &long_text("Headcount"), "annual_report.json", 7, 0.8),
        hit("d", &long_text("Capital expenditure"), "summary.json", 1, 0.7),
    ];

    let answer = answered(
        pipeline(hits, completion, links.clone())
            .ask("Summarize the filings")
            .await
            .unwrap(),
    );

    let files: Vec<&str> = answer
        .citations
        .iter()
        .map(|c| c.source_file.as_str())
        .collect();
    assert_eq!(files, vec!["summary.pdf", "annual_report.pdf"]);
    assert_eq!(answer.citations[0].pages.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(answer.citations[1].display_name, "annual report");

    assert_eq!(answer.notices.len(), 1);
    assert!(answer.notices[0].starts_with("Could not link missing.json"));
    assert_eq!(links.requests().len(), 3);
}

#[tokio::test]
async fn test_outcome_serializes_with_status_tag() {
    let completion = Arc::new(MockCompletionClient::answering("unused"));
    let outcome = pipeline(
        Vec::new(),
        completion.clone(),
        Arc::new(RecordingLinks::default()),
    )
    .ask("Anything?")
    .await
    .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "no_relevant_content");
    assert_eq!(completion.calls(), 0);
}
