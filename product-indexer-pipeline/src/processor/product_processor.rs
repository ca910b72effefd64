//! Page-level processing: runs the normalizer and the projector over a page.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::normalizer::ProductNormalizer;
use super::projector::DocumentProjector;
use crate::errors::TransformError;
use product_indexer_shared::{NormalizedProduct, ProductDocument};

/// Which projections to produce.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorConfig {
    /// Produce relational rows.
    pub normalize: bool,
    /// Produce index documents.
    pub project: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            project: true,
        }
    }
}

/// Output of processing one page. Failed records are skipped, not fatal.
#[derive(Debug, Default)]
pub struct ProcessedPage {
    pub products: Vec<NormalizedProduct>,
    pub documents: Vec<ProductDocument>,
    pub failures: Vec<TransformError>,
}

/// Processor that transforms a page of raw records.
#[derive(Debug, Clone, Default)]
pub struct ProductProcessor {
    normalizer: ProductNormalizer,
    projector: DocumentProjector,
    config: ProcessorConfig,
}

impl ProductProcessor {
    /// Create a processor producing both rows and documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor with custom configuration.
    pub fn with_config(config: ProcessorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> ProcessorConfig {
        self.config
    }

    /// Process a page of raw records.
    ///
    /// # Arguments
    ///
    /// * `records` - Raw records in page order
    /// * `indexing_date` - Unix seconds stamped on every document
    ///
    /// # Returns
    ///
    /// Rows and documents in input order, plus one failure per rejected
    /// record and projection.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub fn process_batch(&self, records: &[Value], indexing_date: i64) -> ProcessedPage {
        let mut page = ProcessedPage {
            products: Vec::with_capacity(if self.config.normalize { records.len() } else { 0 }),
            documents: Vec::with_capacity(if self.config.project { records.len() } else { 0 }),
            failures: Vec::new(),
        };

        for raw in records {
            if self.config.normalize {
                match self.normalizer.normalize(raw) {
                    Ok(product) => page.products.push(product),
                    Err(e) => {
                        warn!(record_id = %e.record_id, error = %e.reason, "Skipping record that failed normalization");
                        page.failures.push(e);
                    }
                }
            }

            if self.config.project {
                match self.projector.project(raw, indexing_date) {
                    Ok(document) => page.documents.push(document),
                    Err(e) => {
                        warn!(record_id = %e.record_id, error = %e.reason, "Skipping record that failed projection");
                        page.failures.push(e);
                    }
                }
            }
        }

        debug!(
            products = page.products.len(),
            documents = page.documents.len(),
            failures = page.failures.len(),
            "Processed record batch"
        );
        page
    }
}
