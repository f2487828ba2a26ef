//! Completion provider implementations.

pub mod chat;
pub mod mock;

pub use chat::ChatCompletionClient;
pub use mock::MockCompletionClient;
