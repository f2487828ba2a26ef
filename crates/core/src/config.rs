//! Configuration management for docintel.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - Config file (`.docintel/config.yaml` or `DOCINTEL_CONFIG`)
//! - Environment variables (`DOCINTEL_*`)
//! - Command-line flags
//!
//! Every knob of the query pipeline lives in one explicit struct that is built
//! once at startup and passed down; nothing reads the environment later.
//! Secrets are never stored in the file, only the names of the environment
//! variables that hold them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Known completion/embedding provider identifiers.
pub const KNOWN_PROVIDERS: [&str; 4] = ["azure-openai", "openai", "hashing", "mock"];

/// Known vector index backends.
pub const KNOWN_BACKENDS: [&str; 3] = ["azure", "local", "memory"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docintel/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON
    pub log_json: bool,

    /// Query embedding service
    pub embedding: EmbeddingSettings,

    /// Vector search service
    pub search: SearchSettings,

    /// Chat completion service
    pub completion: CompletionSettings,

    /// Document storage used for citation links
    pub storage: StorageSettings,

    /// Retrieval limits
    pub retrieval: RetrievalSettings,

    /// Upper bound for every outbound HTTP call, in seconds
    pub request_timeout_secs: u64,
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Provider identifier ("azure-openai", "openai", "hashing")
    pub provider: String,

    /// Base URL of the embeddings API (e.g. `https://<res>.openai.azure.com/openai/deployments/<dep>`)
    pub endpoint: Option<String>,

    /// Model or deployment name
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// `api-version` query parameter (Azure only)
    pub api_version: Option<String>,

    /// Expected vector length
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "azure-openai".to_string(),
            endpoint: None,
            model: "text-embedding-ada-002".to_string(),
            api_key_env: "DOCINTEL_OPENAI_KEY".to_string(),
            api_version: Some("2023-05-15".to_string()),
            dimensions: 1536,
        }
    }
}

/// Vector search settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSettings {
    /// "azure" (hosted search service), "local" (LanceDB) or "memory"
    pub backend: String,

    /// Search service URL (azure backend)
    pub endpoint: Option<String>,

    /// Index name (azure) or table name (local)
    pub index_name: String,

    /// Environment variable holding the search admin/query key
    pub api_key_env: String,

    /// Search REST API version
    pub api_version: String,

    /// LanceDB directory, relative to the workspace (local backend)
    pub local_path: PathBuf,

    /// Directory of embedding records loaded at startup (memory backend)
    pub records_dir: Option<PathBuf>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            backend: "azure".to_string(),
            endpoint: None,
            index_name: "documents".to_string(),
            api_key_env: "DOCINTEL_SEARCH_KEY".to_string(),
            api_version: "2023-11-01".to_string(),
            local_path: PathBuf::from(".docintel/index"),
            records_dir: None,
        }
    }
}

/// Chat completion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionSettings {
    /// Provider identifier ("azure-openai", "openai", "mock")
    pub provider: String,

    /// Full chat-completions URL
    pub endpoint: Option<String>,

    /// Model name (sent in the body for providers that need it)
    pub model: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens in the answer
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            provider: "azure-openai".to_string(),
            endpoint: None,
            model: None,
            api_key_env: "DOCINTEL_OPENAI_KEY".to_string(),
            temperature: 0.3,
            max_tokens: 800,
        }
    }
}

/// Document storage settings used to mint citation links.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Storage account name
    pub account: Option<String>,

    /// Environment variable holding the base64 account key
    pub account_key_env: String,

    /// DNS suffix of the blob endpoint
    pub endpoint_suffix: String,

    /// Container holding the original documents
    pub document_container: String,

    /// Link lifetime in minutes
    pub link_ttl_minutes: u32,

    /// Extension of indexed (parsed) files
    pub index_suffix: String,

    /// Extension of the original documents
    pub document_suffix: String,

    /// Plain base URL used instead of signed links (public containers, local files)
    pub public_base_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            account: None,
            account_key_env: "DOCINTEL_STORAGE_KEY".to_string(),
            endpoint_suffix: "core.windows.net".to_string(),
            document_container: "documents".to_string(),
            link_ttl_minutes: 60,
            index_suffix: ".json".to_string(),
            document_suffix: ".pdf".to_string(),
            public_base_url: None,
        }
    }
}

/// Retrieval limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Candidates requested from the index
    pub k_search: usize,

    /// Chunks kept after filtering
    pub k_final: usize,

    /// Minimum word count of a useful chunk
    pub min_words: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k_search: 10,
            k_final: 4,
            min_words: 30,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    embedding: Option<EmbeddingSettings>,
    search: Option<SearchSettings>,
    completion: Option<CompletionSettings>,
    storage: Option<StorageSettings>,
    retrieval: Option<RetrievalSettings>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            embedding: EmbeddingSettings::default(),
            search: SearchSettings::default(),
            completion: CompletionSettings::default(),
            storage: StorageSettings::default(),
            retrieval: RetrievalSettings::default(),
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `DOCINTEL_WORKSPACE`: Override workspace path
    /// - `DOCINTEL_CONFIG`: Path to config file
    /// - `DOCINTEL_EMBEDDING_ENDPOINT`, `DOCINTEL_SEARCH_ENDPOINT`,
    ///   `DOCINTEL_COMPLETION_ENDPOINT`: service URLs
    /// - `DOCINTEL_STORAGE_ACCOUNT`: storage account for citation links
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docintel_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using a custom environment lookup.
    pub fn load_with<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workspace) = lookup("DOCINTEL_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = lookup("DOCINTEL_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.docintel_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env(&lookup);

        Ok(config)
    }

    /// Apply environment overrides on top of file configuration.
    fn apply_env<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("DOCINTEL_EMBEDDING_ENDPOINT") {
            self.embedding.endpoint = Some(endpoint);
        }

        if let Some(endpoint) = lookup("DOCINTEL_SEARCH_ENDPOINT") {
            self.search.endpoint = Some(endpoint);
        }

        if let Some(endpoint) = lookup("DOCINTEL_COMPLETION_ENDPOINT") {
            self.completion.endpoint = Some(endpoint);
        }

        if let Some(account) = lookup("DOCINTEL_STORAGE_ACCOUNT") {
            self.storage.account = Some(account);
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(search) = config_file.search {
            result.search = search;
        }
        if let Some(completion) = config_file.completion {
            result.completion = completion;
        }
        if let Some(storage) = config_file.storage {
            result.storage = storage;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(timeout) = config_file.request_timeout_secs {
            result.request_timeout_secs = timeout;
        }

        tracing::debug!("Merged config file {:?}", path);

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Override retrieval limits for a single command.
    pub fn with_retrieval_overrides(
        mut self,
        k_search: Option<usize>,
        k_final: Option<usize>,
        min_words: Option<usize>,
    ) -> Self {
        if let Some(k) = k_search {
            self.retrieval.k_search = k;
        }
        if let Some(k) = k_final {
            self.retrieval.k_final = k;
        }
        if let Some(words) = min_words {
            self.retrieval.min_words = words;
        }
        self
    }

    /// Override completion sampling for a single command.
    pub fn with_completion_overrides(
        mut self,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Self {
        if let Some(temperature) = temperature {
            self.completion.temperature = temperature;
        }
        if let Some(max_tokens) = max_tokens {
            self.completion.max_tokens = max_tokens;
        }
        self
    }

    /// Get the path to the .docintel directory.
    pub fn docintel_dir(&self) -> PathBuf {
        self.workspace.join(".docintel")
    }

    /// Ensure the .docintel directory exists.
    pub fn ensure_docintel_dir(&self) -> AppResult<()> {
        let dir = self.docintel_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .docintel directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Absolute path of the local LanceDB index.
    pub fn local_index_path(&self) -> PathBuf {
        if self.search.local_path.is_absolute() {
            self.search.local_path.clone()
        } else {
            self.workspace.join(&self.search.local_path)
        }
    }

    /// Read a secret from the environment variable named in the config.
    pub fn resolve_secret(&self, env_var: &str) -> Option<String> {
        std::env::var(env_var).ok().filter(|v| !v.trim().is_empty())
    }

    /// Validate the configuration before any service client is built.
    pub fn validate(&self) -> AppResult<()> {
        for (role, provider) in [
            ("embedding", &self.embedding.provider),
            ("completion", &self.completion.provider),
        ] {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown {} provider: {}. Supported: {}",
                    role,
                    provider,
                    KNOWN_PROVIDERS.join(", ")
                )));
            }
        }

        if !KNOWN_BACKENDS.contains(&self.search.backend.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown search backend: {}. Supported: {}",
                self.search.backend,
                KNOWN_BACKENDS.join(", ")
            )));
        }

        let retrieval = &self.retrieval;
        if retrieval.k_final < 1 {
            return Err(AppError::Config("kFinal must be at least 1".to_string()));
        }
        if retrieval.k_search < retrieval.k_final {
            return Err(AppError::Config(format!(
                "kSearch ({}) must be greater than or equal to kFinal ({})",
                retrieval.k_search, retrieval.k_final
            )));
        }

        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(AppError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.completion.temperature
            )));
        }
        if self.completion.max_tokens == 0 {
            return Err(AppError::Config("maxTokens must be at least 1".to_string()));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be at least 1".to_string(),
            ));
        }

        if self.storage.link_ttl_minutes == 0 {
            return Err(AppError::Config(
                "linkTtlMinutes must be at least 1".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "requestTimeoutSecs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
