//! Bulk upsert engine.
//!
//! Products are written in fixed-size chunks, one transaction per chunk.
//! Inside a chunk each product is probed, then inserted or updated, and its
//! child rows are rewritten. A failing product is counted and skipped; a
//! failure at the transaction boundary fails the whole chunk.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use product_indexer_repository::{ProductStore, StoreError};
use product_indexer_shared::NormalizedProduct;

/// Configuration for the upsert engine.
#[derive(Debug, Clone)]
pub struct UpsertConfig {
    /// Products per transaction.
    pub chunk_size: usize,
    /// Pause between chunks.
    pub chunk_delay: Duration,
}

impl Default for UpsertConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            chunk_delay: Duration::from_millis(100),
        }
    }
}

/// Counters for one or more upsert calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
    pub errors: usize,
}

impl UpsertSummary {
    pub fn merge(&mut self, other: UpsertSummary) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.errors += other.errors;
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.errors
    }
}

enum WriteOutcome {
    Inserted,
    Updated,
}

/// Engine that upserts normalized products through a [`ProductStore`].
#[derive(Debug, Clone, Default)]
pub struct BulkUpsertEngine {
    config: UpsertConfig,
}

impl BulkUpsertEngine {
    /// Create a new engine with default chunking.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new engine with custom configuration.
    pub fn with_config(config: UpsertConfig) -> Self {
        Self { config }
    }

    /// Upsert `products` in input order.
    ///
    /// # Returns
    ///
    /// Inserted, updated and failed counts. Every product is counted exactly once.
    #[instrument(skip(self, store, products), fields(product_count = products.len()))]
    pub async fn bulk_upsert(
        &self,
        store: &mut dyn ProductStore,
        products: &[NormalizedProduct],
    ) -> UpsertSummary {
        let mut summary = UpsertSummary::default();
        let chunk_size = self.config.chunk_size.max(1);
        let chunk_count = products.len().div_ceil(chunk_size);

        for (index, chunk) in products.chunks(chunk_size).enumerate() {
            if index > 0 && !self.config.chunk_delay.is_zero() {
                tokio::time::sleep(self.config.chunk_delay).await;
            }

            match self.upsert_chunk(store, chunk).await {
                Ok(chunk_summary) => {
                    debug!(
                        chunk = index + 1,
                        chunks = chunk_count,
                        inserted = chunk_summary.inserted,
                        updated = chunk_summary.updated,
                        errors = chunk_summary.errors,
                        "Committed chunk"
                    );
                    summary.merge(chunk_summary);
                }
                Err(e) => {
                    error!(
                        chunk = index + 1,
                        chunks = chunk_count,
                        size = chunk.len(),
                        error = %e,
                        "Chunk failed, rolling back"
                    );
                    if let Err(rollback_err) = store.rollback().await {
                        warn!(error = %rollback_err, "Rollback failed");
                    }
                    summary.errors += chunk.len();
                }
            }
        }

        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            errors = summary.errors,
            "Bulk upsert completed"
        );
        summary
    }

    /// Write one chunk inside a transaction.
    ///
    /// Per-product failures are counted in the returned summary. Failures
    /// that abort the transaction (lost connection, deadlock) and
    /// transaction-control failures are returned as errors so the caller can
    /// roll the chunk back.
    async fn upsert_chunk(
        &self,
        store: &mut dyn ProductStore,
        chunk: &[NormalizedProduct],
    ) -> Result<UpsertSummary, StoreError> {
        store.begin().await?;

        let mut summary = UpsertSummary::default();
        for product in chunk {
            match write_product(store, product).await {
                Ok(WriteOutcome::Inserted) => summary.inserted += 1,
                Ok(WriteOutcome::Updated) => summary.updated += 1,
                Err(e) if e.aborts_chunk() => return Err(e),
                Err(e) => {
                    warn!(product_id = product.id(), error = %e, "Failed to write product");
                    summary.errors += 1;
                }
            }
        }

        store.commit().await?;
        Ok(summary)
    }
}

/// Probe, write the parent row, then rewrite its children.
async fn write_product(
    store: &mut dyn ProductStore,
    product: &NormalizedProduct,
) -> Result<WriteOutcome, StoreError> {
    let row = &product.product;

    let outcome = if store.product_exists(row.id).await? {
        store.update_product(row).await?;
        WriteOutcome::Updated
    } else {
        store.insert_product(row).await?;
        WriteOutcome::Inserted
    };

    rewrite_children(store, product).await?;
    Ok(outcome)
}

/// DELETE-then-INSERT for images and attributes.
///
/// Child failures are logged and skipped unless they abort the transaction.
async fn rewrite_children(
    store: &mut dyn ProductStore,
    product: &NormalizedProduct,
) -> Result<(), StoreError> {
    let product_id = product.id();

    if let Err(e) = store.delete_images(product_id).await {
        if e.aborts_chunk() {
            return Err(e);
        }
        debug!(product_id, error = %e, "Ignoring failed image delete");
    }
    for image in &product.images {
        if let Err(e) = store.insert_image(image).await {
            if e.aborts_chunk() {
                return Err(e);
            }
            warn!(product_id, image_url = %image.image_url, error = %e, "Failed to insert image");
        }
    }

    if let Err(e) = store.delete_attributes(product_id).await {
        if e.aborts_chunk() {
            return Err(e);
        }
        debug!(product_id, error = %e, "Ignoring failed attribute delete");
    }
    for attribute in product.all_attributes() {
        if let Err(e) = store.insert_attribute(attribute).await {
            if e.aborts_chunk() {
                return Err(e);
            }
            warn!(
                product_id,
                attribute = %attribute.attribute_name,
                error = %e,
                "Failed to insert attribute"
            );
        }
    }

    Ok(())
}
