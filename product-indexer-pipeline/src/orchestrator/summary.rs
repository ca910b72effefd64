//! Run summary reported at the end of every run.

use serde::Serialize;
use tracing::info;

use super::maintenance::MaintenanceReport;
use crate::loader::{ErrorAnalysis, ImportReport, UpsertSummary};
use crate::processor::ProcessedPage;
use product_indexer_repository::StoreStats;

/// Counters for one pipeline run. Serializes to the JSON printed by the binary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub start_page: u32,
    /// Last page requested, whether it succeeded or not.
    pub last_page: Option<u32>,
    pub pages_processed: u32,
    pub fetch_errors: u32,

    pub records_fetched: usize,
    pub products_normalized: usize,
    pub documents_projected: usize,
    pub transform_failures: usize,

    pub inserted: usize,
    pub updated: usize,
    pub upsert_errors: usize,

    pub indexed: usize,
    pub index_failures: usize,
    #[serde(rename = "errorAnalysis")]
    pub index_errors: ErrorAnalysis,

    pub initial_stats: Option<StoreStats>,
    pub maintenance: Option<MaintenanceReport>,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn new(start_page: u32, dry_run: bool) -> Self {
        Self {
            start_page,
            dry_run,
            ..Self::default()
        }
    }

    pub(crate) fn record_processed(&mut self, page: &ProcessedPage) {
        self.products_normalized += page.products.len();
        self.documents_projected += page.documents.len();
        self.transform_failures += page.failures.len();
    }

    pub(crate) fn record_upsert(&mut self, upsert: UpsertSummary) {
        self.inserted += upsert.inserted;
        self.updated += upsert.updated;
        self.upsert_errors += upsert.errors;
    }

    pub(crate) fn record_import(&mut self, report: &ImportReport) {
        self.indexed += report.indexed;
        self.index_failures += report.failed;
        self.index_errors.merge(&report.error_analysis);
    }

    pub fn upsert(&self) -> UpsertSummary {
        UpsertSummary {
            inserted: self.inserted,
            updated: self.updated,
            errors: self.upsert_errors,
        }
    }

    pub fn log(&self) {
        info!(
            pages = self.pages_processed,
            fetch_errors = self.fetch_errors,
            records = self.records_fetched,
            normalized = self.products_normalized,
            projected = self.documents_projected,
            transform_failures = self.transform_failures,
            inserted = self.inserted,
            updated = self.updated,
            upsert_errors = self.upsert_errors,
            indexed = self.indexed,
            index_failures = self.index_failures,
            elapsed_ms = self.elapsed_ms,
            dry_run = self.dry_run,
            "Run summary"
        );
        for (message, count) in self.index_errors.most_common() {
            info!(count, error = %message, "Index error");
        }
    }
}
