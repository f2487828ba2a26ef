//! Ask command handler.
//!
//! Answers a question from the indexed documents with page citations.

use super::services::query_pipeline;
use clap::Args;
use docintel_core::{config::AppConfig, AppError, AppResult};
use docintel_knowledge::QueryOutcome;
use std::path::PathBuf;

/// Ask a question about the documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "query")]
    pub file: Option<PathBuf>,

    /// Candidates requested from the index
    #[arg(long)]
    pub k_search: Option<usize>,

    /// Chunks used as context
    #[arg(short = 'k', long)]
    pub k_final: Option<usize>,

    /// Minimum words per context chunk
    #[arg(long)]
    pub min_words: Option<usize>,

    /// Temperature for answer generation (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens in the answer
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Check that each cited document exists before linking it
    #[arg(long)]
    pub verify_links: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let query = self.question()?;

        let config = config
            .clone()
            .with_retrieval_overrides(self.k_search, self.k_final, self.min_words)
            .with_completion_overrides(self.temperature, self.max_tokens);
        config.validate()?;

        let pipeline = query_pipeline(&config, self.verify_links).await?;
        let outcome = pipeline.ask(&query).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            return Ok(());
        }

        match outcome {
            QueryOutcome::NoRelevantContent => {
                eprintln!("warning: No relevant content found in the documents.");
            }
            QueryOutcome::Answered { answer, .. } => {
                println!("{}", answer.text);

                if !answer.citations.is_empty() {
                    println!();
                    println!("Sources:");
                    for citation in &answer.citations {
                        println!(
                            "- {} (pages {}): {}",
                            citation.display_name,
                            citation.pages_label(),
                            citation.url
                        );
                    }
                }

                for notice in &answer.notices {
                    eprintln!("warning: {}", notice);
                }
            }
        }

        Ok(())
    }

    /// The question from the argument or the file.
    fn question(&self) -> AppResult<String> {
        let text = match (&self.query, &self.file) {
            (Some(query), _) => query.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => {
                return Err(AppError::InvalidInput("No question provided".to_string()));
            }
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::InvalidInput("Question cannot be empty".to_string()));
        }
        Ok(text)
    }
}
