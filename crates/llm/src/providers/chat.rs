//! Chat-completions REST client.
//!
//! Speaks the OpenAI chat-completions wire format, which Azure OpenAI
//! deployments also accept. For Azure the endpoint is the full deployment URL
//! including `api-version`; for OpenAI it is `.../v1/chat/completions`.

use crate::client::{ChatMessage, CompletionProvider, CompletionRequest, CompletionResponse};
use crate::types::ProviderType;
use docintel_core::{AppError, AppResult};
use serde::Serialize;
use std::time::Duration;

/// Request body sent to the chat-completions endpoint.
#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// Chat-completions client.
pub struct ChatCompletionClient {
    provider: ProviderType,

    /// Full completions URL
    endpoint: String,

    api_key: Option<String>,

    /// Default model when the request does not name one
    model: Option<String>,

    /// HTTP client (carries the request timeout)
    client: reqwest::Client,
}

impl ChatCompletionClient {
    /// Create a client bound to one completions endpoint.
    pub fn new(
        provider: ProviderType,
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            provider,
            endpoint: endpoint.into(),
            api_key,
            model,
            client,
        })
    }

    fn to_body<'a>(&'a self, request: &'a CompletionRequest) -> ChatCompletionBody<'a> {
        ChatCompletionBody {
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            model: request.model.as_deref().or(self.model.as_deref()),
        }
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ChatCompletionClient {
    fn provider_name(&self) -> &str {
        self.provider.as_str()
    }

    async fn complete(&self, request: &CompletionRequest) -> AppResult<CompletionResponse> {
        tracing::info!(
            "Sending completion request to {} ({} messages)",
            self.provider.as_str(),
            request.messages.len()
        );

        let builder = self.client.post(&self.endpoint).json(&self.to_body(request));
        let response = self
            .provider
            .authorize(builder, self.api_key.as_deref())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::completion(None, "request timed out")
                } else {
                    AppError::completion(None, format!("failed to reach completion endpoint: {}", e))
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            AppError::completion(Some(status), format!("failed to read response body: {}", e))
        })?;

        if (200..300).contains(&status) {
            tracing::info!("Received completion ({} bytes)", body.len());
        } else {
            tracing::warn!("Completion endpoint returned status {}", status);
        }

        Ok(CompletionResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(provider: ProviderType, model: Option<&str>) -> ChatCompletionClient {
        ChatCompletionClient::new(
            provider,
            "http://localhost:9/chat/completions",
            Some("secret".to_string()),
            model.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_body_carries_sampling_options() {
        let client = client(ProviderType::AzureOpenAi, None);
        let request = CompletionRequest::new(vec![ChatMessage::user("Hello")])
            .with_temperature(0.3)
            .with_max_tokens(800);

        let json = serde_json::to_value(client.to_body(&request)).unwrap();
        assert_eq!(json["max_tokens"], 800);
        assert_eq!(json["messages"][0]["content"], "Hello");
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_body_falls_back_to_default_model() {
        let client = client(ProviderType::OpenAi, Some("gpt-4o"));
        let request = CompletionRequest::new(vec![ChatMessage::user("Hello")]);

        let json = serde_json::to_value(client.to_body(&request)).unwrap();
        assert_eq!(json["model"], "gpt-4o");
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(client(ProviderType::OpenAi, None).provider_name(), "openai");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_completion_failure() {
        let client = ChatCompletionClient::new(
            ProviderType::AzureOpenAi,
            "http://127.0.0.1:9/chat/completions",
            None,
            None,
            Duration::from_millis(500),
        )
        .unwrap();

        let request = CompletionRequest::new(vec![ChatMessage::user("Hello")]);
        let result = client.complete(&request).await;
        assert!(matches!(
            result,
            Err(AppError::Completion {
                status_code: None,
                ..
            })
        ));
    }
}
