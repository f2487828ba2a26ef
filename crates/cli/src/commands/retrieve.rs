//! Retrieve command handler.
//!
//! Runs retrieval only and prints the ranked chunks.

use super::services::retriever;
use clap::Args;
use docintel_core::{config::AppConfig, AppResult};

/// Show the chunks a question would be answered from
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// The question to search for
    pub query: String,

    /// Candidates requested from the index
    #[arg(long)]
    pub k_search: Option<usize>,

    /// Chunks kept after filtering
    #[arg(short = 'k', long)]
    pub k_final: Option<usize>,

    /// Minimum words per chunk
    #[arg(long)]
    pub min_words: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command");

        let config = config
            .clone()
            .with_retrieval_overrides(self.k_search, self.k_final, self.min_words);
        config.validate()?;

        let result = retriever(&config)
            .await?
            .retrieve_with(&self.query, config.retrieval)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        if result.is_empty() {
            println!("No relevant content found in the documents.");
            return Ok(());
        }

        for (i, hit) in result.chunks.iter().enumerate() {
            println!(
                "{}. [{}, page {}] score {:.3}",
                i + 1,
                hit.source,
                hit.page,
                hit.score
            );
            println!("{}", hit.text.trim());
            println!();
        }

        Ok(())
    }
}
