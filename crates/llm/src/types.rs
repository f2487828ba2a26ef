//! Provider identifiers.

/// Hosted API flavor, which decides authentication and request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// Azure OpenAI: `api-key` header, deployment encoded in the URL
    AzureOpenAi,
    /// OpenAI-compatible: bearer token, model in the body
    OpenAi,
    /// Scripted, no network
    Mock,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "azure-openai" | "azure" => Some(Self::AzureOpenAi),
            "openai" => Some(Self::OpenAi),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AzureOpenAi => "azure-openai",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }

    /// Attach the API key to a request the way this provider expects.
    pub fn authorize(
        &self,
        builder: reqwest::RequestBuilder,
        api_key: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match (self, api_key) {
            (Self::AzureOpenAi, Some(key)) => builder.header("api-key", key),
            (Self::OpenAi, Some(key)) => builder.bearer_auth(key),
            _ => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("azure-openai"), Some(ProviderType::AzureOpenAi));
        assert_eq!(ProviderType::parse("Azure"), Some(ProviderType::AzureOpenAi));
        assert_eq!(ProviderType::parse("openai"), Some(ProviderType::OpenAi));
        assert_eq!(ProviderType::parse("mock"), Some(ProviderType::Mock));
        assert_eq!(ProviderType::parse("ollama"), None);
    }

    #[test]
    fn test_round_trip_names() {
        for provider in [ProviderType::AzureOpenAi, ProviderType::OpenAi, ProviderType::Mock] {
            assert_eq!(ProviderType::parse(provider.as_str()), Some(provider));
        }
    }
}
