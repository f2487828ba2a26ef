//! Scripted completion provider.

use crate::client::{CompletionProvider, CompletionRequest, CompletionResponse};
use docintel_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What the mock answers with.
#[derive(Debug, Clone)]
enum Script {
    Respond(CompletionResponse),
    TransportError(String),
}

/// Completion provider that replays a fixed response and records requests.
///
/// Used by tests and by `completion.provider: mock` for offline runs.
#[derive(Debug)]
pub struct MockCompletionClient {
    script: Script,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockCompletionClient {
    /// Answer every request with a successful chat completion carrying `content`.
    pub fn answering(content: &str) -> Self {
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        });
        Self::with_response(CompletionResponse::new(200, body.to_string()))
    }

    /// Answer every request with the given raw response.
    pub fn with_response(response: CompletionResponse) -> Self {
        Self::from_script(Script::Respond(response))
    }

    /// Fail every request as if the endpoint were unreachable.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_script(Script::TransportError(message.into()))
    }

    fn from_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(None)
    }
}

#[async_trait::async_trait]
impl CompletionProvider for MockCompletionClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> AppResult<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.last_request.lock() {
            *slot = Some(request.clone());
        }

        match &self.script {
            Script::Respond(response) => Ok(response.clone()),
            Script::TransportError(message) => Err(AppError::completion(None, message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    #[tokio::test]
    async fn test_answering_records_request() {
        let mock = MockCompletionClient::answering("42");
        let request = CompletionRequest::new(vec![ChatMessage::user("question")]);

        let response = mock.complete(&request).await.unwrap();
        assert_eq!(response.answer_text().unwrap(), "42");
        assert_eq!(mock.calls(), 1);
        assert_eq!(
            mock.last_request().unwrap().messages[0].content,
            "question"
        );
    }

    #[tokio::test]
    async fn test_failing() {
        let mock = MockCompletionClient::failing("connection refused");
        let request = CompletionRequest::new(vec![ChatMessage::user("question")]);

        assert!(mock.complete(&request).await.is_err());
        assert_eq!(mock.calls(), 1);
    }
}
