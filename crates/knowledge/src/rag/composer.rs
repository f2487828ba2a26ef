//! Grounded answer generation.

use crate::rag::types::SourceNaming;
use crate::types::{Answer, RetrievalResult};
use docintel_core::{AppError, AppResult};
use docintel_llm::{ChatMessage, CompletionProvider, CompletionRequest};
use docintel_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Separator placed between context chunks.
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Placeholder used when the completion succeeded without answer text.
pub const MALFORMED_RESPONSE_TEXT: &str = "Unexpected response format from the completion service.";

/// Builds the grounded prompt and turns the completion into an [`Answer`].
///
/// Composition never fails: completion problems become a placeholder answer
/// plus a notice.
#[derive(Clone)]
pub struct AnswerComposer {
    completion: Arc<dyn CompletionProvider>,
    prompt: PromptDefinition,
    temperature: f32,
    max_tokens: u32,
    model: Option<String>,
    naming: SourceNaming,
}

impl AnswerComposer {
    /// Create a composer. The prompt templates are rendered once here so a
    /// broken override is reported at startup.
    pub fn new(completion: Arc<dyn CompletionProvider>, prompt: PromptDefinition) -> AppResult<Self> {
        build_prompt(&prompt, &prompt_variables("", ""))?;

        Ok(Self {
            completion,
            prompt,
            temperature: 0.3,
            max_tokens: 800,
            model: None,
            naming: SourceNaming::default(),
        })
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Naming used to show chunk sources as document file names.
    pub fn with_naming(mut self, naming: SourceNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Chat messages for a query and its retrieved context.
    pub fn build_messages(&self, query: &str, result: &RetrievalResult) -> AppResult<Vec<ChatMessage>> {
        let context = build_context(result, &self.naming);
        let built = build_prompt(&self.prompt, &prompt_variables(query, &context))?;

        Ok(vec![
            ChatMessage::system(built.system),
            ChatMessage::user(built.user),
        ])
    }

    /// Ask the completion provider for a grounded answer.
    pub async fn compose(&self, query: &str, result: &RetrievalResult) -> Answer {
        let messages = match self.build_messages(query, result) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Failed to build prompt: {}", e);
                return placeholder(format!("Could not build the prompt: {}", e), e);
            }
        };

        let mut request = CompletionRequest::new(messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }

        debug!(
            "Requesting completion from '{}' with {} context chunks",
            self.completion.provider_name(),
            result.len()
        );

        let outcome = match self.completion.complete(&request).await {
            Ok(response) => response.answer_text(),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(text) => Answer {
                text,
                citations: Vec::new(),
                notices: Vec::new(),
            },
            Err(e) => {
                warn!("Completion did not produce an answer: {}", e);
                placeholder(placeholder_text(&e), e)
            }
        }
    }
}

fn prompt_variables(query: &str, context: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("query".to_string(), query.to_string());
    vars.insert("context".to_string(), context.to_string());
    vars
}

/// Join chunks, each headed by the document file and page they came from.
pub fn build_context(result: &RetrievalResult, naming: &SourceNaming) -> String {
    result
        .chunks
        .iter()
        .map(|chunk| {
            format!(
                "(Source: {}, Page: {})\n{}",
                naming.document_file(&chunk.source),
                chunk.page,
                chunk.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

fn placeholder_text(error: &AppError) -> String {
    match error {
        AppError::Completion {
            status_code: Some(code),
            message,
        } => format!("Request failed: {} - {}", code, message),
        AppError::Completion {
            status_code: None,
            message,
        } => format!("Request failed: {}", message),
        AppError::MalformedCompletion(_) => MALFORMED_RESPONSE_TEXT.to_string(),
        other => format!("Request failed: {}", other),
    }
}

fn placeholder(text: String, error: AppError) -> Answer {
    Answer {
        text,
        citations: Vec::new(),
        notices: vec![error.to_string()],
    }
}
