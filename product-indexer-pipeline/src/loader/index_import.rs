//! Index import engine.
//!
//! Documents are validated against the index schema, then submitted in
//! batches. Every document ends up either indexed or recorded as a
//! [`DocumentFailure`] in the report's histogram.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::error_analysis::{DocumentFailure, ErrorAnalysis, DEFAULT_MAX_EXAMPLES};
use product_indexer_repository::{
    validate_document, ImportItemResult, SearchIndexError, SearchIndexProvider,
};
use product_indexer_shared::ProductDocument;

/// Configuration for the import engine.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Documents per import request.
    pub batch_size: usize,
    /// Examples retained per error message.
    pub max_examples_per_error: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_examples_per_error: DEFAULT_MAX_EXAMPLES,
        }
    }
}

/// Outcome of importing a set of documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub indexed: usize,
    pub failed: usize,
    pub errors: Vec<DocumentFailure>,
    #[serde(rename = "errorAnalysis")]
    pub error_analysis: ErrorAnalysis,
}

impl ImportReport {
    pub fn new(max_examples_per_error: usize) -> Self {
        Self {
            indexed: 0,
            failed: 0,
            errors: Vec::new(),
            error_analysis: ErrorAnalysis::new(max_examples_per_error),
        }
    }

    fn record_failure(&mut self, failure: DocumentFailure) {
        self.failed += 1;
        self.error_analysis.record(&failure);
        self.errors.push(failure);
    }

    pub fn merge(&mut self, other: ImportReport) {
        self.merge_limited(other, usize::MAX);
    }

    /// Merge counts and histogram in full, keeping at most `max_failures`
    /// raw failures overall.
    pub fn merge_limited(&mut self, other: ImportReport, max_failures: usize) {
        let room = max_failures.saturating_sub(self.errors.len());
        self.indexed += other.indexed;
        self.failed += other.failed;
        self.error_analysis.merge(&other.error_analysis);
        self.errors.extend(other.errors.into_iter().take(room));
    }
}

impl Default for ImportReport {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXAMPLES)
    }
}

/// Engine that imports documents into a [`SearchIndexProvider`].
pub struct IndexImportEngine {
    client: Arc<dyn SearchIndexProvider>,
    config: ImportConfig,
}

impl IndexImportEngine {
    /// Create a new engine with default batching.
    pub fn new(client: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            client,
            config: ImportConfig::default(),
        }
    }

    /// Create a new engine with custom configuration.
    pub fn with_config(client: Arc<dyn SearchIndexProvider>, config: ImportConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &Arc<dyn SearchIndexProvider> {
        &self.client
    }

    /// Import `documents` in batches, one request at a time.
    #[instrument(skip(self, documents), fields(document_count = documents.len()))]
    pub async fn import(&self, documents: &[ProductDocument]) -> ImportReport {
        let mut report = ImportReport::new(self.config.max_examples_per_error);

        for batch in documents.chunks(self.config.batch_size.max(1)) {
            self.import_batch(batch, &mut report).await;
        }

        if report.failed > 0 {
            warn!(
                indexed = report.indexed,
                failed = report.failed,
                distinct_errors = report.error_analysis.len(),
                "Import finished with failures"
            );
        } else {
            info!(indexed = report.indexed, "Import completed");
        }
        report
    }

    async fn import_batch(&self, batch: &[ProductDocument], report: &mut ImportReport) {
        let mut accepted: Vec<ProductDocument> = Vec::with_capacity(batch.len());

        for document in batch {
            match preflight(document) {
                Ok(()) => accepted.push(document.clone()),
                Err(message) => {
                    debug!(object_id = %document.object_id, error = %message, "Document failed schema check");
                    report.record_failure(DocumentFailure::new(document, message, None));
                }
            }
        }

        if accepted.is_empty() {
            return;
        }

        match self.client.import_documents(&accepted).await {
            Ok(results) => classify(&accepted, &results, report),
            Err(e) => match e.import_results() {
                Some(results) => {
                    warn!(error = %e, "Import request failed, classifying per-document results");
                    classify(&accepted, results, report);
                }
                None => {
                    error!(error = %e, count = accepted.len(), "Import request failed");
                    let message = failure_message(&e);
                    for document in &accepted {
                        report.record_failure(DocumentFailure::new(document, message.clone(), None));
                    }
                }
            },
        }
    }
}

/// Schema check on the serialized form, which is what the index sees.
fn preflight(document: &ProductDocument) -> Result<(), String> {
    let value = serde_json::to_value(document).map_err(|e| e.to_string())?;
    validate_document(&value).map_err(|e| failure_message(&e))
}

/// Histogram key for an error: validation messages without their prefix.
fn failure_message(err: &SearchIndexError) -> String {
    match err {
        SearchIndexError::ValidationError(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Match results to documents by position.
fn classify(documents: &[ProductDocument], results: &[ImportItemResult], report: &mut ImportReport) {
    for (index, document) in documents.iter().enumerate() {
        match results.get(index) {
            Some(result) if result.success => report.indexed += 1,
            Some(result) => {
                let message = result
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown import error".to_string());
                report.record_failure(DocumentFailure::new(document, message, result.code));
            }
            None => {
                report.record_failure(DocumentFailure::new(document, "no import result returned", None));
            }
        }
    }
}
