//! Time-limited document links for citations.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use docintel_core::config::StorageSettings;
use docintel_core::{AppConfig, AppError, AppResult};
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode, Url};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;

/// Storage service version the signature format follows.
const SAS_VERSION: &str = "2020-12-06";

/// Produces a URL granting temporary read access to a stored document.
#[async_trait::async_trait]
pub trait LinkFactory: Send + Sync {
    /// Fails with `AppError::LinkGeneration` when credentials are missing or
    /// the file cannot be linked.
    async fn make_link(&self, container: &str, file_name: &str, ttl_minutes: u32)
        -> AppResult<String>;
}

/// Service SAS links for Azure Blob storage, signed with the account key.
pub struct BlobSasLinkFactory {
    account: Option<String>,
    account_key: Option<String>,
    endpoint_suffix: String,
    client: Client,
    verify_exists: bool,
}

impl BlobSasLinkFactory {
    pub fn new(
        account: Option<String>,
        account_key: Option<String>,
        endpoint_suffix: &str,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            account,
            account_key,
            endpoint_suffix: endpoint_suffix.to_string(),
            client,
            verify_exists: false,
        })
    }

    /// Issue a HEAD request for every link and fail if the blob is missing.
    pub fn with_existence_check(mut self, verify: bool) -> Self {
        self.verify_exists = verify;
        self
    }

    /// Build the signed URL for a blob expiring at `expiry`.
    pub fn signed_url(
        &self,
        container: &str,
        blob: &str,
        expiry: DateTime<Utc>,
    ) -> AppResult<String> {
        let account = self.account.as_deref().ok_or_else(|| {
            AppError::LinkGeneration("Storage account is not configured".to_string())
        })?;
        let account_key = self.account_key.as_deref().ok_or_else(|| {
            AppError::LinkGeneration(format!("No account key available for '{}'", account))
        })?;

        let key = BASE64
            .decode(account_key.trim())
            .map_err(|e| AppError::LinkGeneration(format!("Account key is not valid base64: {}", e)))?;

        let expiry = expiry.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let resource = format!("/blob/{}/{}/{}", account, container, blob);
        // Field order: sp, st, se, resource, si, sip, spr, sv, sr, snapshot, ses,
        // then the five response header overrides
        let fields: [&str; 16] = [
            "r",
            "",
            expiry.as_str(),
            resource.as_str(),
            "",
            "",
            "https",
            SAS_VERSION,
            "b",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ];
        let string_to_sign = fields.join("\n");

        let mut mac = Hmac::<Sha256>::new_from_slice(&key)
            .map_err(|e| AppError::LinkGeneration(format!("Invalid account key: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let mut url = Url::parse(&format!(
            "https://{}.blob.{}/",
            account, self.endpoint_suffix
        ))
        .map_err(|e| AppError::LinkGeneration(format!("Invalid storage URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| AppError::LinkGeneration("Storage URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(container)
            .push(blob);

        url.query_pairs_mut()
            .append_pair("sv", SAS_VERSION)
            .append_pair("spr", "https")
            .append_pair("sr", "b")
            .append_pair("sp", "r")
            .append_pair("se", &expiry)
            .append_pair("sig", &signature);

        Ok(url.to_string())
    }

    async fn check_exists(&self, url: &str, blob: &str) -> AppResult<()> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| AppError::LinkGeneration(format!("Could not reach storage: {}", e)))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(AppError::LinkGeneration(format!(
                "Document not found: {}",
                blob
            ))),
            s => Err(AppError::LinkGeneration(format!(
                "Storage returned {} for {}",
                s.as_u16(),
                blob
            ))),
        }
    }
}

#[async_trait::async_trait]
impl LinkFactory for BlobSasLinkFactory {
    async fn make_link(
        &self,
        container: &str,
        file_name: &str,
        ttl_minutes: u32,
    ) -> AppResult<String> {
        let expiry = Utc::now() + ChronoDuration::minutes(i64::from(ttl_minutes));
        let url = self.signed_url(container, file_name, expiry)?;

        if self.verify_exists {
            self.check_exists(&url, file_name).await?;
        }

        Ok(url)
    }
}

/// Unsigned links under a fixed base URL (local file servers, public buckets).
pub struct StaticLinkFactory {
    base_url: Url,
}

impl StaticLinkFactory {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid public base URL '{}': {}", base_url, e)))?;
        Ok(Self { base_url })
    }
}

#[async_trait::async_trait]
impl LinkFactory for StaticLinkFactory {
    async fn make_link(
        &self,
        container: &str,
        file_name: &str,
        _ttl_minutes: u32,
    ) -> AppResult<String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::LinkGeneration(format!("Base URL cannot hold a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .push(container)
            .push(file_name);
        Ok(url.to_string())
    }
}

/// Pick the link factory for the storage settings.
///
/// A public base URL wins; otherwise links are signed with the account key
/// read from `storage.accountKeyEnv`.
pub fn create_link_factory(
    config: &AppConfig,
    verify_exists: bool,
) -> AppResult<Arc<dyn LinkFactory>> {
    let storage: &StorageSettings = &config.storage;

    if let Some(base) = &storage.public_base_url {
        return Ok(Arc::new(StaticLinkFactory::new(base)?));
    }

    let factory = BlobSasLinkFactory::new(
        storage.account.clone(),
        config.resolve_secret(&storage.account_key_env),
        &storage.endpoint_suffix,
        Duration::from_secs(config.request_timeout_secs),
    )?
    .with_existence_check(verify_exists);

    Ok(Arc::new(factory))
}
