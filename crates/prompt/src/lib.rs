//! Prompt templates for docintel.
//!
//! This crate provides:
//! - YAML-based prompt definitions with a system and a user template
//! - Handlebars rendering
//! - The built-in grounded-answer prompt used by the answer composer

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::{grounded_answer_prompt, GROUNDED_ANSWER_PROMPT_ID};
pub use loader::{load_prompt, load_prompt_or_default};
pub use types::{BuiltPrompt, PromptDefinition};
