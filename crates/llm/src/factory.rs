//! Completion provider factory.
//!
//! Resolves a provider name from configuration into a shared client. Called
//! once at startup; the resulting `Arc` is handed to the answer composer.

use crate::client::CompletionProvider;
use crate::providers::{ChatCompletionClient, MockCompletionClient};
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;

/// Create a completion client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("azure-openai", "openai", "mock")
/// * `endpoint` - Full chat-completions URL (required for hosted providers)
/// * `api_key` - API key (required for hosted providers)
/// * `model` - Default model name sent in the body
/// * `timeout` - Upper bound for each request
///
/// # Errors
/// Returns a message if the provider is unknown or a required value is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    model: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn CompletionProvider>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;

    match provider_type {
        ProviderType::Mock => Ok(Arc::new(MockCompletionClient::answering(
            "Mock completion provider: no answer generated.",
        ))),
        ProviderType::AzureOpenAi | ProviderType::OpenAi => {
            let endpoint = endpoint.ok_or_else(|| {
                format!("{} provider requires a completion endpoint", provider_type.as_str())
            })?;
            let api_key = api_key.ok_or_else(|| {
                format!("{} provider requires an API key", provider_type.as_str())
            })?;

            let client = ChatCompletionClient::new(
                provider_type,
                endpoint,
                Some(api_key.to_string()),
                model.map(str::to_string),
                timeout,
            )
            .map_err(|e| e.to_string())?;

            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn test_create_mock_client() {
        let client = create_client("mock", None, None, None, TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "mock");
    }

    #[test]
    fn test_create_azure_client() {
        let client = create_client(
            "azure-openai",
            Some("https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions"),
            Some("key"),
            None,
            TIMEOUT,
        )
        .unwrap();
        assert_eq!(client.provider_name(), "azure-openai");
    }

    #[test]
    fn test_azure_requires_endpoint() {
        match create_client("azure-openai", None, Some("key"), None, TIMEOUT) {
            Err(err) => assert!(err.contains("requires a completion endpoint")),
            Ok(_) => panic!("Expected error without endpoint"),
        }
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client(
            "openai",
            Some("https://api.openai.com/v1/chat/completions"),
            None,
            Some("gpt-4o"),
            TIMEOUT,
        ) {
            Err(err) => assert!(err.contains("requires an API key")),
            Ok(_) => panic!("Expected error without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("ollama", None, None, None, TIMEOUT) {
            Err(err) => assert!(err.contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
