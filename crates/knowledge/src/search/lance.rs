//! LanceDB-backed local vector index.

use crate::embeddings::cosine_similarity;
use crate::types::{IndexDocument, SearchHit};
use crate::vector_index::{IndexWriter, VectorIndex};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use docintel_core::{AppError, AppResult};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use std::path::Path;
use std::sync::Arc;

/// Default table holding page documents.
pub const DEFAULT_TABLE: &str = "documents";

/// Local index storing the same fields as the hosted one.
pub struct LanceDbIndex {
    table: Table,
    embedding_dim: usize,
}

impl LanceDbIndex {
    /// Create or open a LanceDB index at the specified path.
    ///
    /// # Arguments
    /// * `db_path` - Directory path for the LanceDB database
    /// * `table_name` - Name of the table (typically "documents")
    /// * `embedding_dim` - Dimension of embedding vectors (e.g., 1536)
    pub async fn open(db_path: &Path, table_name: &str, embedding_dim: usize) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Index(format!("Failed to create index directory: {}", e))
            })?;
        }

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to connect to LanceDB: {}", e)))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to list tables: {}", e)))?;

        let table = if table_names.iter().any(|name| name == table_name) {
            conn.open_table(table_name)
                .execute()
                .await
                .map_err(|e| AppError::Index(format!("Failed to open table: {}", e)))?
        } else {
            let schema = Self::create_schema(embedding_dim);
            let empty_batch = RecordBatch::new_empty(schema.clone());

            conn.create_table(
                table_name,
                RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to create table: {}", e)))?
        };

        tracing::debug!("Initialized LanceDB index at {:?}", db_path);

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    fn create_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("page", DataType::UInt32, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }

    /// Build one columnar batch from a slice of documents.
    fn documents_to_batch(&self, documents: &[IndexDocument]) -> AppResult<RecordBatch> {
        let mut values = Vec::with_capacity(documents.len() * self.embedding_dim);
        for doc in documents {
            if doc.embedding.len() != self.embedding_dim {
                return Err(AppError::Index(format!(
                    "Embedding dimension mismatch for {}: expected {}, got {}",
                    doc.id,
                    self.embedding_dim,
                    doc.embedding.len()
                )));
            }
            values.extend_from_slice(&doc.embedding);
        }

        let ids = StringArray::from_iter_values(documents.iter().map(|d| d.id.as_str()));
        let texts = StringArray::from_iter_values(documents.iter().map(|d| d.text.as_str()));
        let sources = StringArray::from_iter_values(documents.iter().map(|d| d.source.as_str()));
        let pages = UInt32Array::from_iter_values(documents.iter().map(|d| d.page));
        let embeddings = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding_dim as i32,
            Arc::new(Float32Array::from(values)),
            None,
        )
        .map_err(|e| AppError::Index(format!("Failed to build embedding column: {}", e)))?;

        RecordBatch::try_new(
            Self::create_schema(self.embedding_dim),
            vec![
                Arc::new(ids),
                Arc::new(texts),
                Arc::new(sources),
                Arc::new(pages),
                Arc::new(embeddings),
            ],
        )
        .map_err(|e| AppError::Index(format!("Failed to create RecordBatch: {}", e)))
    }

    /// Convert every row of a result batch into a hit scored against `query`.
    fn batch_to_hits(batch: &RecordBatch, query: &[f32]) -> AppResult<Vec<SearchHit>> {
        fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a T> {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<T>())
                .ok_or_else(|| AppError::Search(format!("Invalid {} column", name)))
        }

        let ids = column::<StringArray>(batch, "id")?;
        let texts = column::<StringArray>(batch, "text")?;
        let sources = column::<StringArray>(batch, "source")?;
        let pages = column::<UInt32Array>(batch, "page")?;
        let embeddings = column::<FixedSizeListArray>(batch, "embedding")?;

        let mut hits = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let vector_ref = embeddings.value(row);
            let vector = vector_ref
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| AppError::Search("Invalid embedding values".to_string()))?;

            hits.push(SearchHit {
                id: ids.value(row).to_string(),
                text: texts.value(row).to_string(),
                source: sources.value(row).to_string(),
                page: pages.value(row),
                score: cosine_similarity(query, vector.values()),
            });
        }

        Ok(hits)
    }

    /// Number of stored documents.
    pub async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| AppError::Index(format!("Failed to count rows: {}", e)))
    }

    /// Remove every stored document.
    pub async fn reset(&self) -> AppResult<()> {
        if self.count().await? > 0 {
            self.table
                .delete("id IS NOT NULL")
                .await
                .map_err(|e| AppError::Index(format!("Failed to reset index: {}", e)))?;
        }

        tracing::info!("Reset LanceDB index");
        Ok(())
    }
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    fn backend_name(&self) -> &str {
        "local"
    }

    async fn search(&self, vector: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        if vector.len() != self.embedding_dim {
            return Err(AppError::Search(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                vector.len()
            )));
        }

        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .nearest_to(vector.to_vec())
            .map_err(|e| AppError::Search(format!("Failed to create query: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .map_err(|e| AppError::Search(format!("Failed to execute search: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Search(format!("Failed to collect results: {}", e)))?;

        let mut hits = Vec::new();
        for batch in &batches {
            hits.extend(Self::batch_to_hits(batch, vector)?);
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        tracing::debug!("Retrieved {} hits (requested top-{})", hits.len(), k);
        Ok(hits)
    }
}

#[async_trait::async_trait]
impl IndexWriter for LanceDbIndex {
    async fn upload(&self, documents: &[IndexDocument]) -> AppResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let batch = self.documents_to_batch(documents)?;
        let schema = batch.schema();

        self.table
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await
            .map_err(|e| AppError::Index(format!("Failed to add documents: {}", e)))?;

        tracing::debug!("Inserted {} documents into LanceDB", documents.len());
        Ok(documents.len())
    }
}
