//! Hosted vector search over the Azure AI Search REST API.

use crate::types::{IndexDocument, SearchHit};
use crate::vector_index::{IndexWriter, VectorIndex};
use docintel_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Vector field queried by `vectorQueries`.
const VECTOR_FIELD: &str = "embedding";

/// Search index client (`docs/search` for queries, `docs/index` for uploads).
#[derive(Clone)]
pub struct AzureSearchIndex {
    client: Client,
    endpoint: String,
    index_name: String,
    api_key: String,
    api_version: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    value: Vec<SearchDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchDocument {
    #[serde(rename = "@search.score", default)]
    score: f32,
    #[serde(default)]
    id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

#[derive(Debug, Serialize)]
struct UploadAction<'a> {
    #[serde(rename = "@search.action")]
    action: &'static str,
    #[serde(flatten)]
    document: &'a IndexDocument,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    value: Vec<UploadStatus>,
}

#[derive(Debug, Deserialize)]
struct UploadStatus {
    key: String,
    status: bool,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

impl AzureSearchIndex {
    pub fn new(
        endpoint: &str,
        index_name: &str,
        api_key: &str,
        api_version: &str,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            index_name: index_name.to_string(),
            api_key: api_key.to_string(),
            api_version: api_version.to_string(),
        })
    }

    fn docs_url(&self, operation: &str) -> String {
        format!(
            "{}/indexes/{}/docs/{}?api-version={}",
            self.endpoint, self.index_name, operation, self.api_version
        )
    }

    fn search_body(vector: &[f32], k: usize) -> serde_json::Value {
        json!({
            "select": "id,text,source,page",
            "top": k,
            "vectorQueries": [{
                "kind": "vector",
                "vector": vector,
                "k": k,
                "fields": VECTOR_FIELD,
            }],
        })
    }

    fn parse_hits(body: &str) -> AppResult<Vec<SearchHit>> {
        let response: SearchResponse = serde_json::from_str(body)
            .map_err(|e| AppError::Search(format!("Invalid search response: {}", e)))?;

        // Pages are 1-based; documents without one cannot be cited
        let mut hits: Vec<SearchHit> = response
            .value
            .into_iter()
            .filter_map(|doc| match doc.page {
                Some(page) if page >= 1 => Some(SearchHit {
                    id: doc.id,
                    text: doc.text.unwrap_or_default(),
                    source: doc.source.unwrap_or_default(),
                    page,
                    score: doc.score,
                }),
                _ => {
                    debug!("Skipping search document {} without a page", doc.id);
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(hits)
    }
}

#[async_trait::async_trait]
impl VectorIndex for AzureSearchIndex {
    fn backend_name(&self) -> &str {
        "azure"
    }

    #[instrument(skip(self, vector), fields(index = %self.index_name))]
    async fn search(&self, vector: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        let url = self.docs_url("search");
        debug!("Querying search index at {}", url);

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&Self::search_body(vector, k))
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Search request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Search(format!("Failed to read search response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::Search(format!(
                "Search request failed: {} - {}",
                status.as_u16(),
                body
            )));
        }

        let hits = Self::parse_hits(&body)?;
        debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }
}

#[async_trait::async_trait]
impl IndexWriter for AzureSearchIndex {
    #[instrument(skip(self, documents), fields(index = %self.index_name, count = documents.len()))]
    async fn upload(&self, documents: &[IndexDocument]) -> AppResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let actions: Vec<UploadAction<'_>> = documents
            .iter()
            .map(|document| UploadAction {
                action: "upload",
                document,
            })
            .collect();

        let response = self
            .client
            .post(self.docs_url("index"))
            .header("api-key", &self.api_key)
            .json(&json!({ "value": actions }))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("Upload request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Index(format!("Failed to read upload response: {}", e)))?;

        // 207 means some documents were rejected; the body lists which
        if !status.is_success() {
            return Err(AppError::Index(format!(
                "Upload failed: {} - {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::Index(format!("Invalid upload response: {}", e)))?;

        let mut accepted = 0;
        for item in parsed.value {
            if item.status {
                accepted += 1;
            } else {
                warn!(
                    "Document {} rejected: {}",
                    item.key,
                    item.error_message.unwrap_or_default()
                );
            }
        }

        Ok(accepted)
    }
}
