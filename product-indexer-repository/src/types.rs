//! Result types returned by the store and search index backends.

use serde::{Deserialize, Serialize};

/// Tables covered by the storage-level optimization sweep.
pub const MAINTAINED_TABLES: [&str; 5] = [
    "products",
    "product_images",
    "product_variations",
    "product_attributes",
    "facet_counts",
];

/// Outcome of importing a single document, in the same order as the input batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportItemResult {
    /// Whether the index accepted the document.
    pub success: bool,
    /// The document id echoed back by the index, when present.
    pub object_id: Option<String>,
    /// Error message reported by the index.
    pub error: Option<String>,
    /// Status or error code reported by the index.
    pub code: Option<u16>,
}

impl ImportItemResult {
    /// A successful outcome.
    pub fn ok(object_id: impl Into<String>) -> Self {
        Self {
            success: true,
            object_id: Some(object_id.into()),
            error: None,
            code: None,
        }
    }

    /// A failed outcome with the index's error message.
    pub fn failed(object_id: Option<String>, error: impl Into<String>, code: Option<u16>) -> Self {
        Self {
            success: false,
            object_id,
            error: Some(error.into()),
            code,
        }
    }
}

/// Row counts reported before a run (or alone, in stats-only mode).
///
/// Variation and facet tables are read-only for the indexer and may be
/// absent in a fresh schema, hence optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub products: i64,
    pub active_products: i64,
    pub images: i64,
    pub attributes: i64,
    pub variations: Option<i64>,
    pub facet_counts: Option<i64>,
}
