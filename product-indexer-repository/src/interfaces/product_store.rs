//! Relational product store trait definition.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::types::StoreStats;
use product_indexer_shared::{ProductAttribute, ProductImage, ProductRow};

/// A single database session owned by one pipeline run.
///
/// Session control (`begin`, `commit`, `rollback`, and the maintenance
/// operations) is issued as unprepared statements; row-level reads and
/// writes go through parameterized prepared statements. Methods take
/// `&mut self` because the session is never shared between writers.
#[async_trait]
pub trait ProductStore: Send {
    /// Open a transaction on the session.
    async fn begin(&mut self) -> Result<(), StoreError>;

    /// Commit the open transaction.
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Roll back the open transaction.
    async fn rollback(&mut self) -> Result<(), StoreError>;

    /// Return whether a `products` row with this id exists.
    async fn product_exists(&mut self, id: i64) -> Result<bool, StoreError>;

    /// Insert a new `products` row. `updated_at` is set by the store.
    async fn insert_product(&mut self, row: &ProductRow) -> Result<(), StoreError>;

    /// Overwrite every mutable column of an existing row and refresh `updated_at`.
    async fn update_product(&mut self, row: &ProductRow) -> Result<(), StoreError>;

    /// Delete all `product_images` rows of a product, returning how many were removed.
    async fn delete_images(&mut self, product_id: i64) -> Result<u64, StoreError>;

    /// Insert one `product_images` row.
    async fn insert_image(&mut self, image: &ProductImage) -> Result<(), StoreError>;

    /// Delete all `product_attributes` rows of a product, returning how many were removed.
    async fn delete_attributes(&mut self, product_id: i64) -> Result<u64, StoreError>;

    /// Insert one `product_attributes` row.
    async fn insert_attribute(&mut self, attribute: &ProductAttribute) -> Result<(), StoreError>;

    /// Delete inactive products (and their child rows) not updated for `older_than_days`.
    ///
    /// Returns the number of `products` rows removed.
    async fn cleanup_inactive(&mut self, older_than_days: u32) -> Result<u64, StoreError>;

    /// Re-materialize facet counts through the stored aggregator.
    async fn update_facets(&mut self) -> Result<(), StoreError>;

    /// Run storage-level optimization on one of [`crate::MAINTAINED_TABLES`].
    async fn optimize_table(&mut self, table: &str) -> Result<(), StoreError>;

    /// Count rows in the indexed and read-only tables.
    async fn stats(&mut self) -> Result<StoreStats, StoreError>;
}
