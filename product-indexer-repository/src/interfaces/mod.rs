//! Interface definitions for the storage backends.
//!
//! The pipeline only talks to these traits, so the MySQL and OpenSearch
//! implementations can be swapped for in-memory ones in tests.

mod product_store;
mod search_index_provider;

pub use product_store::ProductStore;
pub use search_index_provider::SearchIndexProvider;
