//! Loader module for the product indexer pipeline.
//!
//! Writes processed pages to the relational store and the search index.

mod error_analysis;
mod index_import;
mod upsert;

pub use error_analysis::{DocumentFailure, ErrorAnalysis, ErrorBucket};
pub use index_import::{ImportConfig, ImportReport, IndexImportEngine};
pub use upsert::{BulkUpsertEngine, UpsertConfig, UpsertSummary};
