//! HTTP client for the upstream catalog API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use super::messages::{parse_envelope, CatalogPage};
use super::retry::retry_with_backoff;
use super::CatalogSource;
use crate::errors::{FetchError, PipelineError};

/// Configuration for the catalog API client.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Endpoint returning one page per request.
    pub base_url: String,
    /// Records requested per page (`page_size` query parameter).
    pub page_size: u32,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Attempts per page before giving up.
    pub max_retries: u32,
    /// Base of the linear backoff between attempts.
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl SourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            page_size: 100,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            user_agent: concat!("product-indexer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Catalog API client.
///
/// Issues `GET {base_url}?page_size={n}&page={p}` and retries failed
/// attempts with linear backoff.
pub struct CatalogApiClient {
    client: Client,
    config: SourceConfig,
}

impl CatalogApiClient {
    /// Create a new client.
    ///
    /// # Returns
    ///
    /// * `Ok(CatalogApiClient)` - A client with the configured timeout and user agent
    /// * `Err(PipelineError)` - If the base URL is empty or the HTTP client cannot be built
    pub fn new(config: SourceConfig) -> Result<Self, PipelineError> {
        if config.base_url.trim().is_empty() {
            return Err(PipelineError::source("catalog API URL is empty"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| PipelineError::source(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// One request, no retries.
    async fn fetch_once(&self, page: u32) -> Result<CatalogPage, String> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("page_size", self.config.page_size), ("page", page)])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("catalog API returned status {}: {}", status, body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("invalid response body: {}", e))?;

        parse_envelope(&body)
    }
}

#[async_trait]
impl CatalogSource for CatalogApiClient {
    #[instrument(skip(self))]
    async fn fetch_page(&self, page: u32) -> Result<CatalogPage, FetchError> {
        let result = retry_with_backoff(
            page,
            self.config.max_retries,
            self.config.retry_delay,
            |_| self.fetch_once(page),
        )
        .await?;

        debug!(
            page,
            records = result.records.len(),
            page_count = ?result.page_count,
            "Fetched catalog page"
        );
        Ok(result)
    }
}
