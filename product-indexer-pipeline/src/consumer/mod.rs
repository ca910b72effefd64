//! Consumer module for the product indexer pipeline.
//!
//! Provides the catalog API client that fetches pages of raw product records.

mod catalog_client;
mod messages;
mod retry;

pub use catalog_client::{CatalogApiClient, SourceConfig};
pub use messages::{parse_envelope, CatalogPage};
pub use retry::retry_with_backoff;

use async_trait::async_trait;

use crate::errors::FetchError;

/// A paginated source of raw product records.
///
/// Implementations must be idempotent: fetching the same page twice is safe.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page, retrying transient failures internally.
    async fn fetch_page(&self, page: u32) -> Result<CatalogPage, FetchError>;
}
