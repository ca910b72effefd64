//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::SearchIndexConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::get_index_settings;
use crate::types::ImportItemResult;
use product_indexer_shared::ProductDocument;

/// OpenSearch client implementation.
///
/// Imports are sent through the bulk API with one `index` action per
/// document, keyed by `objectID`, which replaces an existing document or
/// creates a new one.
///
/// # Example
///
/// ```ignore
/// let config = SearchIndexConfig::new("http://localhost:9200").with_index_name("products");
/// let client = OpenSearchClient::new(config)?;
/// let results = client.import_documents(&documents).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    config: SearchIndexConfig,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client for the configured server and index.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub fn new(config: SearchIndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %config.url,
            index = %config.index_name,
            "Created OpenSearch client"
        );

        Ok(Self { client, config })
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Build the NDJSON bulk body: an action line followed by the document.
    fn bulk_body(documents: &[ProductDocument]) -> Result<Vec<JsonBody<Value>>, SearchIndexError> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);

        for doc in documents {
            body.push(json!({ "index": { "_id": doc.object_id } }).into());
            let source = serde_json::to_value(doc)
                .map_err(|e| SearchIndexError::validation(e.to_string()))?;
            body.push(source.into());
        }

        Ok(body)
    }

    /// Parse the per-item outcomes of a bulk response, in request order.
    fn parse_bulk_items(response: &Value) -> Option<Vec<ImportItemResult>> {
        let items = response.get("items")?.as_array()?;

        let results = items
            .iter()
            .map(|item| {
                let action = item
                    .as_object()
                    .and_then(|actions| actions.values().next())
                    .unwrap_or(&Value::Null);

                let object_id = action
                    .get("_id")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let status = action
                    .get("status")
                    .and_then(Value::as_u64)
                    .and_then(|s| u16::try_from(s).ok());

                match action.get("error") {
                    Some(error) if !error.is_null() => {
                        let message = error
                            .get("reason")
                            .and_then(Value::as_str)
                            .or_else(|| error.get("type").and_then(Value::as_str))
                            .map(str::to_string)
                            .unwrap_or_else(|| error.to_string());
                        ImportItemResult::failed(object_id, message, status)
                    }
                    _ if status.is_some_and(|s| s >= 300) => {
                        ImportItemResult::failed(object_id, "rejected without reason", status)
                    }
                    _ => ImportItemResult {
                        success: true,
                        object_id,
                        error: None,
                        code: status,
                    },
                }
            })
            .collect();

        Some(results)
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchClient {
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn import_documents(
        &self,
        documents: &[ProductDocument],
    ) -> Result<Vec<ImportItemResult>, SearchIndexError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        self.validate_batch_size(documents.len())?;
        let body = Self::bulk_body(documents)?;

        let response = self
            .client
            .bulk(BulkParts::Index(&self.config.index_name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::import_failed(e.to_string()))?;

        let status = response.status_code();
        let text = response
            .text()
            .await
            .map_err(|e| SearchIndexError::import_failed(e.to_string()))?;
        let parsed: Option<Value> = serde_json::from_str(&text).ok();
        let results = parsed.as_ref().and_then(Self::parse_bulk_items);

        if !status.is_success() {
            error!(status = %status, "Bulk import request failed");
            return Err(SearchIndexError::ImportFailed {
                message: format!("Bulk import failed with status {}", status),
                results,
            });
        }

        let results = results
            .ok_or_else(|| SearchIndexError::parse("Bulk response has no items array"))?;

        if results.len() != documents.len() {
            return Err(SearchIndexError::parse(format!(
                "Bulk response has {} items for {} documents",
                results.len(),
                documents.len()
            )));
        }

        debug!(count = results.len(), "Bulk import completed");
        Ok(results)
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let index = self.config.index_name.as_str();

        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(index = %index, "Search index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(get_index_settings())
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %index, "Created search index");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let health: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;
        let status = health
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        debug!(status = %status, "OpenSearch cluster health");
        Ok(matches!(status, "green" | "yellow"))
    }
}
