//! # Product Indexer Repository
//!
//! This crate provides the storage seams of the product indexer: the
//! relational [`ProductStore`] with its MySQL implementation, and the
//! [`SearchIndexProvider`] with its OpenSearch implementation. It also owns
//! the search index mappings and the document schema check run before
//! every import.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod mysql;
pub mod opensearch;
pub mod types;

pub use config::{SearchIndexConfig, StoreConfig};
pub use errors::{SearchIndexError, StoreError};
pub use interfaces::{ProductStore, SearchIndexProvider};
pub use mysql::MySqlProductStore;
pub use opensearch::{validate_document, OpenSearchClient};
pub use types::{ImportItemResult, StoreStats, MAINTAINED_TABLES};
