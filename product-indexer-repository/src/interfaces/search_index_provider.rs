//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::ImportItemResult;
use product_indexer_shared::ProductDocument;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// All methods return `Result<T, SearchIndexError>` for consistent error handling across
/// different backend implementations.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the pipeline still submits one batch at a time.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Upsert a batch of documents keyed by `objectID`.
    ///
    /// # Arguments
    ///
    /// * `documents` - The documents to import
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ImportItemResult>)` - One outcome per document, in input order
    /// * `Err(SearchIndexError::ImportFailed)` - If the request failed; per-document
    ///   outcomes are attached when the server still reported them
    /// * `Err(SearchIndexError)` - If the request could not be sent at all
    async fn import_documents(
        &self,
        documents: &[ProductDocument],
    ) -> Result<Vec<ImportItemResult>, SearchIndexError>;

    /// Ensure the search index exists with the product mappings.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index exists or was created successfully
    /// * `Err(SearchIndexError)` - If index creation fails
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the search engine is healthy
    /// * `Ok(false)` - If the search engine is unhealthy
    /// * `Err(SearchIndexError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchIndexError>;
}
