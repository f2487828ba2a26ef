//! Embed command handler.
//!
//! Turns parsed page files into embedding records on disk.

use super::services::{embedding_provider, stderr_progress};
use clap::Args;
use docintel_core::{config::AppConfig, AppError, AppResult};
use docintel_knowledge::ingest::{embed_documents, EmbedOptions};
use std::path::PathBuf;

/// Embed parsed page files
#[derive(Args, Debug)]
pub struct EmbedCommand {
    /// Directory of parsed page files (`<doc>.json`)
    pub input: PathBuf,

    /// Where to write embedding records (default: next to the page files)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Split pages longer than this many characters
    #[arg(long)]
    pub chunk_chars: Option<usize>,

    /// Re-embed pages that already have records
    #[arg(long)]
    pub overwrite: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EmbedCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing embed command for {:?}", self.input);

        if !self.input.is_dir() {
            return Err(AppError::InvalidInput(format!(
                "Input directory does not exist: {:?}",
                self.input
            )));
        }

        let output = self.output.clone().unwrap_or_else(|| self.input.clone());
        let provider = embedding_provider(config)?;
        let options = EmbedOptions {
            chunk_chars: self.chunk_chars,
            overwrite: self.overwrite,
        };

        let stats = embed_documents(
            provider.as_ref(),
            &self.input,
            &output,
            &options,
            &stderr_progress(self.quiet || self.json),
        )
        .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Embedded {} documents: {} records written, {} already present, {} blank pages skipped",
                stats.documents, stats.records_written, stats.existing_records, stats.skipped_pages
            );
        }

        Ok(())
    }
}
