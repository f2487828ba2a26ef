//! Command handlers for the docintel CLI.
//!
//! `embed` and `index` prepare the search index; `retrieve` and `ask` query it.

pub mod ask;
pub mod embed;
pub mod index;
pub mod retrieve;
mod services;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use embed::EmbedCommand;
pub use index::IndexCommand;
pub use retrieve::RetrieveCommand;
