//! Completion client abstraction and request/response types.

use docintel_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat-completion conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Conversation, system message first
    pub messages: Vec<ChatMessage>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Model identifier, for APIs that take it in the body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl CompletionRequest {
    /// Create a new request from a list of messages.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
            model: None,
        }
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the model name sent in the body.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Raw completion response: HTTP status plus body text.
///
/// The provider does not interpret the body; callers decide what a
/// non-success status means for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub status_code: u16,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl CompletionResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    /// Whether the status code is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Extract `choices[0].message.content`.
    ///
    /// # Errors
    /// - `AppError::Completion` for a non-success status
    /// - `AppError::MalformedCompletion` when the answer field is absent
    pub fn answer_text(&self) -> AppResult<String> {
        if !self.is_success() {
            return Err(AppError::completion(Some(self.status_code), self.body.clone()));
        }

        let parsed: ChatCompletionBody = serde_json::from_str(&self.body)
            .map_err(|e| AppError::MalformedCompletion(format!("invalid JSON body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                AppError::MalformedCompletion("missing choices[0].message.content".to_string())
            })
    }
}

/// Trait for chat-completion providers.
///
/// Implementations must be safe to share between concurrent queries.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name (e.g., "azure-openai", "mock").
    fn provider_name(&self) -> &str;

    /// Send a completion request.
    ///
    /// Returns the raw status and body for any HTTP answer, including errors.
    /// `Err` is reserved for transport failures and timeouts.
    async fn complete(&self, request: &CompletionRequest) -> AppResult<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_unset_fields() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("Be precise."),
            ChatMessage::user("What was the revenue?"),
        ])
        .with_temperature(0.3)
        .with_max_tokens(800);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 800);
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_answer_text_success() {
        let response = CompletionResponse::new(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"Revenue was 4,034."}}]}"#,
        );
        assert_eq!(response.answer_text().unwrap(), "Revenue was 4,034.");
    }

    #[test]
    fn test_answer_text_error_status() {
        let response = CompletionResponse::new(500, "Internal Server Error");
        match response.answer_text() {
            Err(AppError::Completion {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, Some(500));
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("Expected completion failure, got {:?}", other),
        }
    }

    #[test]
    fn test_answer_text_missing_choices() {
        let response = CompletionResponse::new(200, r#"{"choices":[]}"#);
        assert!(matches!(
            response.answer_text(),
            Err(AppError::MalformedCompletion(_))
        ));
    }

    #[test]
    fn test_answer_text_not_json() {
        let response = CompletionResponse::new(200, "<html>gateway</html>");
        assert!(matches!(
            response.answer_text(),
            Err(AppError::MalformedCompletion(_))
        ));
    }
}
