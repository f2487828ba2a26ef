//! Ingestion tools: page files to embedding records, records to an index.
//!
//! File formats:
//! - parsed page file `<doc>.json`: `[{"page": 1, "text": "..."}]`
//! - embedding record `<doc>.page<N>.embedding.json`:
//!   `{"embedding": [...], "text": "...", "source": "<doc>.json", "page": N}`

use crate::embeddings::{check_embedding, EmbeddingProvider};
use crate::progress::ProgressReporter;
use crate::types::{EmbeddingRecord, IndexDocument, PageRecord};
use crate::vector_index::IndexWriter;
use docintel_core::{AppError, AppResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use text_splitter::TextSplitter;
use walkdir::WalkDir;

/// Suffix of embedding record files.
pub const EMBEDDING_SUFFIX: &str = ".embedding.json";

/// Documents per upload request.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Options for [`embed_documents`].
#[derive(Debug, Clone, Default)]
pub struct EmbedOptions {
    /// Split pages longer than this many characters into several records
    pub chunk_chars: Option<usize>,

    /// Rewrite records that already exist
    pub overwrite: bool,
}

/// Counters reported by [`embed_documents`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbedStats {
    pub documents: usize,
    pub pages: usize,
    pub skipped_pages: usize,
    pub existing_records: usize,
    pub records_written: usize,
}

/// Counters reported by [`upload_documents`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadStats {
    pub batches: usize,
    pub submitted: usize,
    pub accepted: usize,
}

/// Record file name for one page: `report.json` page 3 → `report.page3.embedding.json`.
///
/// `part` numbers the pieces of a split page and is omitted for whole pages.
pub fn record_name(source: &str, page: u32, part: Option<usize>) -> String {
    let stem = source.strip_suffix(".json").unwrap_or(source);
    match part {
        Some(part) => format!("{}.page{}.part{}{}", stem, page, part, EMBEDDING_SUFFIX),
        None => format!("{}.page{}{}", stem, page, EMBEDDING_SUFFIX),
    }
}

/// Read a parsed page file.
pub fn read_pages(path: &Path) -> AppResult<Vec<PageRecord>> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| AppError::Ingest(format!("Invalid page file {:?}: {}", path, e)))
}

/// Source name of a file: its path relative to `root`, with `/` separators.
fn source_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parsed page files under `input_dir`, sorted.
fn page_files(input_dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(AppError::Ingest(format!(
            "Input directory does not exist: {:?}",
            input_dir
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            let name = p.to_string_lossy();
            name.ends_with(".json") && !name.ends_with(EMBEDDING_SUFFIX)
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Split page text into the pieces that get their own record.
fn page_pieces(text: &str, chunk_chars: Option<usize>) -> Vec<String> {
    match chunk_chars {
        Some(limit) if limit > 0 && text.chars().count() > limit => TextSplitter::new(limit)
            .chunks(text)
            .filter(|piece| !piece.trim().is_empty())
            .map(str::to_string)
            .collect(),
        _ => vec![text.to_string()],
    }
}

/// Embed every non-blank page under `input_dir` and write embedding records
/// into `output_dir`, mirroring the input layout.
pub async fn embed_documents(
    provider: &dyn EmbeddingProvider,
    input_dir: &Path,
    output_dir: &Path,
    options: &EmbedOptions,
    progress: &ProgressReporter,
) -> AppResult<EmbedStats> {
    let mut stats = EmbedStats::default();

    tracing::info!(
        "Embedding page files from {:?} with {} ({})",
        input_dir,
        provider.provider_name(),
        provider.model_name()
    );

    for path in page_files(input_dir)? {
        let source = source_name(input_dir, &path);
        let pages = read_pages(&path)?;
        stats.documents += 1;

        for page in pages {
            stats.pages += 1;
            if page.text.trim().is_empty() {
                stats.skipped_pages += 1;
                continue;
            }

            let pieces = page_pieces(&page.text, options.chunk_chars);
            let split = pieces.len() > 1;
            let names: Vec<String> = (0..pieces.len())
                .map(|i| record_name(&source, page.page, split.then_some(i + 1)))
                .collect();

            if !options.overwrite && names.iter().all(|n| output_dir.join(n).exists()) {
                stats.existing_records += names.len();
                continue;
            }

            let vectors = provider.embed_batch(&pieces).await?;
            if vectors.len() != pieces.len() {
                return Err(AppError::Embedding(format!(
                    "Expected {} embeddings for page {} of {}, got {}",
                    pieces.len(),
                    page.page,
                    source,
                    vectors.len()
                )));
            }

            for ((text, embedding), name) in pieces.into_iter().zip(vectors).zip(names) {
                check_embedding(&embedding, provider.dimensions())?;

                let record = EmbeddingRecord {
                    embedding,
                    text,
                    source: source.clone(),
                    page: page.page,
                };
                write_record(&output_dir.join(&name), &record)?;

                stats.records_written += 1;
                progress.embedded(stats.records_written as u64, &source, page.page, &name);
            }
        }
    }

    tracing::info!(
        "Embedded {} documents: {} records written, {} blank pages skipped",
        stats.documents,
        stats.records_written,
        stats.skipped_pages
    );

    Ok(stats)
}

fn write_record(path: &Path, record: &EmbeddingRecord) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(record)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read every embedding record under `dir`, sorted by path.
pub fn load_embedding_records(dir: &Path) -> AppResult<Vec<(PathBuf, EmbeddingRecord)>> {
    if !dir.is_dir() {
        return Err(AppError::Ingest(format!(
            "Records directory does not exist: {:?}",
            dir
        )));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.to_string_lossy().ends_with(EMBEDDING_SUFFIX))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let contents = std::fs::read_to_string(&path)?;
            let record: EmbeddingRecord = serde_json::from_str(&contents).map_err(|e| {
                AppError::Ingest(format!("Invalid embedding record {:?}: {}", path, e))
            })?;
            Ok((path, record))
        })
        .collect()
}

/// Embedding records under `dir` as index documents with fresh UUIDs.
pub fn load_index_documents(dir: &Path) -> AppResult<Vec<IndexDocument>> {
    Ok(load_embedding_records(dir)?
        .into_iter()
        .map(|(_, record)| IndexDocument::from_record(record))
        .collect())
}

/// Upload documents in batches of `batch_size`.
pub async fn upload_documents(
    writer: &dyn IndexWriter,
    documents: &[IndexDocument],
    batch_size: usize,
    progress: &ProgressReporter,
) -> AppResult<UploadStats> {
    if batch_size == 0 {
        return Err(AppError::InvalidInput(
            "Batch size must be at least 1".to_string(),
        ));
    }

    let mut stats = UploadStats::default();
    let total = documents.len() as u64;

    for batch in documents.chunks(batch_size) {
        let accepted = writer.upload(batch).await?;

        stats.batches += 1;
        stats.submitted += batch.len();
        stats.accepted += accepted;

        if accepted < batch.len() {
            tracing::warn!(
                "Index accepted {} of {} documents in batch {}",
                accepted,
                batch.len(),
                stats.batches
            );
        }

        progress.uploaded(stats.submitted as u64, total, batch.len());
    }

    tracing::info!(
        "Uploaded {} documents in {} batches ({} accepted)",
        stats.submitted,
        stats.batches,
        stats.accepted
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingProvider;
    use crate::store::ChunkStore;
    use tempfile::TempDir;

    fn write_pages(dir: &Path, name: &str, pages: &[(u32, &str)]) {
        let records: Vec<PageRecord> = pages
            .iter()
            .map(|(page, text)| PageRecord {
                page: *page,
                text: text.to_string(),
            })
            .collect();
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string(&records).unwrap()).unwrap();
    }

    #[test]
    fn test_record_name() {
        assert_eq!(record_name("report.json", 3, None), "report.page3.embedding.json");
        assert_eq!(
            record_name("2023/report.json", 1, Some(2)),
            "2023/report.page1.part2.embedding.json"
        );
    }

    #[tokio::test]
    async fn test_embed_documents_skips_blank_pages() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_pages(
            input.path(),
            "report.json",
            &[(1, "Revenue grew strongly"), (2, "   "), (3, "Net income rose")],
        );

        let provider = HashingProvider::new(16);
        let stats = embed_documents(
            &provider,
            input.path(),
            output.path(),
            &EmbedOptions::default(),
            &ProgressReporter::noop(),
        )
        .await
        .unwrap();

        assert_eq!(stats.documents, 1);
        assert_eq!(stats.pages, 3);
        assert_eq!(stats.skipped_pages, 1);
        assert_eq!(stats.records_written, 2);

        let records = load_embedding_records(output.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].0.ends_with("report.page1.embedding.json"));
        assert_eq!(records[0].1.source, "report.json");
        assert_eq!(records[1].1.page, 3);
        assert_eq!(records[1].1.embedding.len(), 16);
    }

    #[tokio::test]
    async fn test_embed_documents_keeps_existing_records() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_pages(input.path(), "a.json", &[(1, "alpha beta")]);

        let provider = HashingProvider::new(8);
        let options = EmbedOptions::default();
        let reporter = ProgressReporter::noop();

        embed_documents(&provider, input.path(), output.path(), &options, &reporter)
            .await
            .unwrap();
        let second = embed_documents(&provider, input.path(), output.path(), &options, &reporter)
            .await
            .unwrap();

        assert_eq!(second.records_written, 0);
        assert_eq!(second.existing_records, 1);
    }

    #[tokio::test]
    async fn test_embed_documents_splits_long_pages() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let long_text = "Revenue grew in every quarter of the year. ".repeat(20);
        write_pages(input.path(), "long.json", &[(4, long_text.as_str())]);

        let provider = HashingProvider::new(8);
        let options = EmbedOptions {
            chunk_chars: Some(200),
            overwrite: false,
        };
        let stats = embed_documents(
            &provider,
            input.path(),
            output.path(),
            &options,
            &ProgressReporter::noop(),
        )
        .await
        .unwrap();

        assert!(stats.records_written > 1);
        assert!(output.path().join("long.page4.part1.embedding.json").exists());
        for (_, record) in load_embedding_records(output.path()).unwrap() {
            assert_eq!(record.page, 4);
            assert!(record.text.chars().count() <= 200);
        }
    }

    #[tokio::test]
    async fn test_missing_input_dir() {
        let output = TempDir::new().unwrap();
        let result = embed_documents(
            &HashingProvider::new(8),
            &output.path().join("missing"),
            output.path(),
            &EmbedOptions::default(),
            &ProgressReporter::noop(),
        )
        .await;
        assert!(matches!(result, Err(AppError::Ingest(_))));
    }

    #[tokio::test]
    async fn test_upload_in_batches() {
        let documents: Vec<IndexDocument> = (0..250)
            .map(|i| IndexDocument {
                id: format!("doc-{}", i),
                text: format!("text {}", i),
                source: "report.json".to_string(),
                page: 1,
                embedding: vec![1.0, 0.0],
            })
            .collect();

        let store = ChunkStore::new();
        let stats = upload_documents(
            &store,
            &documents,
            DEFAULT_BATCH_SIZE,
            &ProgressReporter::noop(),
        )
        .await
        .unwrap();

        assert_eq!(stats.batches, 3);
        assert_eq!(stats.submitted, 250);
        assert_eq!(stats.accepted, 250);
        assert_eq!(store.len().await, 250);
    }

    #[tokio::test]
    async fn test_upload_rejects_zero_batch() {
        let store = ChunkStore::new();
        let result = upload_documents(&store, &[], 0, &ProgressReporter::noop()).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
