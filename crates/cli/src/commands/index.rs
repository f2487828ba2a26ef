//! Index command handler.
//!
//! Uploads embedding records to the configured search backend.

use super::services::stderr_progress;
use clap::Args;
use docintel_core::{config::AppConfig, AppError, AppResult};
use docintel_knowledge::ingest::{load_index_documents, upload_documents, DEFAULT_BATCH_SIZE};
use docintel_knowledge::open_backend;
use docintel_knowledge::search::LanceDbIndex;
use std::path::PathBuf;

/// Upload embedding records to the search index
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Directory of embedding records (`*.embedding.json`)
    pub input: PathBuf,

    /// Documents per upload request
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Drop the local index before uploading (local backend only)
    #[arg(long)]
    pub reset: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(
            "Executing index command for {:?} (backend: {})",
            self.input,
            config.search.backend
        );

        if !self.input.is_dir() {
            return Err(AppError::InvalidInput(format!(
                "Records directory does not exist: {:?}",
                self.input
            )));
        }

        if self.reset {
            if config.search.backend != "local" {
                return Err(AppError::InvalidInput(format!(
                    "--reset is only supported for the local backend, not '{}'",
                    config.search.backend
                )));
            }
            let local = LanceDbIndex::open(
                &config.local_index_path(),
                &config.search.index_name,
                config.embedding.dimensions,
            )
            .await?;
            local.reset().await?;
        }

        let documents = load_index_documents(&self.input)?;
        if documents.is_empty() {
            eprintln!("warning: no embedding records found in {:?}", self.input);
            return Ok(());
        }

        let backend = open_backend(config).await?;
        if !backend.persistent {
            eprintln!(
                "warning: backend '{}' keeps documents in memory only; nothing will be persisted",
                config.search.backend
            );
        }

        let stats = upload_documents(
            backend.writer.as_ref(),
            &documents,
            self.batch_size,
            &stderr_progress(self.quiet || self.json),
        )
        .await?;

        if stats.accepted < stats.submitted {
            eprintln!(
                "warning: index rejected {} of {} documents",
                stats.submitted - stats.accepted,
                stats.submitted
            );
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Uploaded {} documents in {} batches ({} accepted)",
                stats.submitted, stats.batches, stats.accepted
            );
        }

        Ok(())
    }
}
