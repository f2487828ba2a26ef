//! Vector search backends.
//!
//! - `azure`: hosted Azure AI Search index
//! - `local`: LanceDB table on disk
//! - `memory`: [`ChunkStore`] loaded from embedding records

pub mod azure;
pub mod lance;

pub use azure::AzureSearchIndex;
pub use lance::LanceDbIndex;

use crate::ingest::load_index_documents;
use crate::store::ChunkStore;
use crate::vector_index::{IndexWriter, VectorIndex};
use docintel_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// A configured backend, usable both for queries and for uploads.
#[derive(Clone)]
pub struct SearchBackend {
    pub index: Arc<dyn VectorIndex>,
    pub writer: Arc<dyn IndexWriter>,
    /// Whether uploads survive the process
    pub persistent: bool,
}

impl SearchBackend {
    fn from_shared<T>(backend: Arc<T>, persistent: bool) -> Self
    where
        T: VectorIndex + IndexWriter + 'static,
    {
        Self {
            index: backend.clone(),
            writer: backend,
            persistent,
        }
    }
}

/// Open the backend selected by `search.backend`.
pub async fn open_backend(config: &AppConfig) -> AppResult<SearchBackend> {
    let settings = &config.search;
    let timeout = Duration::from_secs(config.request_timeout_secs);

    tracing::debug!("Opening search backend '{}'", settings.backend);

    match settings.backend.as_str() {
        "azure" => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                AppError::Config(
                    "Search backend 'azure' requires search.endpoint or DOCINTEL_SEARCH_ENDPOINT"
                        .to_string(),
                )
            })?;
            let api_key = config.resolve_secret(&settings.api_key_env).ok_or_else(|| {
                AppError::Config(format!(
                    "Search backend 'azure' requires an API key in ${}",
                    settings.api_key_env
                ))
            })?;

            let index = AzureSearchIndex::new(
                endpoint,
                &settings.index_name,
                &api_key,
                &settings.api_version,
                timeout,
            )?;
            Ok(SearchBackend::from_shared(Arc::new(index), true))
        }

        "local" => {
            let index = LanceDbIndex::open(
                &config.local_index_path(),
                &settings.index_name,
                config.embedding.dimensions,
            )
            .await?;
            Ok(SearchBackend::from_shared(Arc::new(index), true))
        }

        "memory" => {
            let store = match &settings.records_dir {
                Some(dir) => {
                    let dir = if dir.is_absolute() {
                        dir.clone()
                    } else {
                        config.workspace.join(dir)
                    };
                    ChunkStore::from_documents(load_index_documents(&dir)?)
                }
                None => ChunkStore::new(),
            };
            tracing::info!("Loaded {} chunks into memory", store.len().await);
            Ok(SearchBackend::from_shared(Arc::new(store), false))
        }

        other => Err(AppError::Config(format!(
            "Unknown search backend: {}",
            other
        ))),
    }
}
