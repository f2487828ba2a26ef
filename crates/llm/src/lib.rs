//! Completion provider crate for docintel.
//!
//! This crate provides a provider-agnostic abstraction over chat-completion
//! endpoints. The answer composer only sees the [`CompletionProvider`] trait,
//! so hosted services and scripted test doubles are interchangeable.
//!
//! # Providers
//! - **ChatCompletionClient**: Azure OpenAI / OpenAI chat-completions REST API
//! - **MockCompletionClient**: scripted responses for tests and offline runs
//!
//! # Example
//! ```no_run
//! use docintel_llm::{ChatMessage, CompletionProvider, CompletionRequest, providers::ChatCompletionClient};
//! use docintel_llm::ProviderType;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ChatCompletionClient::new(
//!     ProviderType::AzureOpenAi,
//!     "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-01",
//!     Some("key".to_string()),
//!     None,
//!     Duration::from_secs(30),
//! )?;
//! let request = CompletionRequest::new(vec![ChatMessage::user("Hello")]);
//! let response = client.complete(&request).await?;
//! println!("{}", response.status_code);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, ChatRole, CompletionProvider, CompletionRequest, CompletionResponse};
pub use factory::create_client;
pub use providers::{ChatCompletionClient, MockCompletionClient};
pub use types::ProviderType;
