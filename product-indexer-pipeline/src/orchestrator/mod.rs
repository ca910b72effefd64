//! Orchestrator module for the product indexer pipeline.
//!
//! Drives the page loop: fetch a page, transform it, write it to the store
//! and the index, then move on until pagination ends, the page cap is hit
//! or too many fetches fail in a row.

mod maintenance;
mod summary;

pub use maintenance::{run_maintenance, MaintenanceConfig, MaintenanceReport, TaskOutcome};
pub use summary::RunSummary;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{CatalogPage, CatalogSource};
use crate::errors::PipelineError;
use crate::loader::{BulkUpsertEngine, ImportReport, IndexImportEngine};
use crate::processor::{ProcessedPage, ProductProcessor};
use crate::report::{DebugReporter, MAX_REPORTED_FAILURES};
use product_indexer_repository::ProductStore;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// First page to fetch (1-based).
    pub start_page: u32,
    /// Page cap; 0 fetches until the source is exhausted.
    pub max_pages: u32,
    /// Pause between pages.
    pub page_delay: Duration,
    /// Pause after a failed fetch.
    pub error_delay: Duration,
    /// Consecutive failed fetches tolerated before the run aborts.
    pub max_consecutive_errors: u32,
    /// Fetch and transform, but write nothing.
    pub dry_run: bool,
    pub maintenance: MaintenanceConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            start_page: 1,
            max_pages: 1,
            page_delay: Duration::from_millis(100),
            error_delay: Duration::from_secs(2),
            max_consecutive_errors: 5,
            dry_run: false,
            maintenance: MaintenanceConfig::default(),
        }
    }
}

/// Driver states. Each page moves through `Fetching`, `Normalizing` and `Writing`.
#[derive(Debug)]
enum DriverState {
    Idle,
    Fetching { page: u32 },
    Normalizing { page: u32, fetched: CatalogPage },
    Writing { page: u32, processed: ProcessedPage, has_more: bool },
    MaintenanceSweep,
    Done,
    Fatal(PipelineError),
}

/// Orchestrator that drives the pipeline components.
///
/// The orchestrator:
/// - Walks pages from the catalog source in ascending order
/// - Fans each page out to the store and the index
/// - Enforces the page cap and the consecutive-error limit
/// - Runs the maintenance sweep and reports the run summary
pub struct Orchestrator {
    source: Arc<dyn CatalogSource>,
    processor: ProductProcessor,
    upsert: BulkUpsertEngine,
    store: Option<Box<dyn ProductStore>>,
    importer: Option<IndexImportEngine>,
    reporter: Option<DebugReporter>,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create an orchestrator with no write targets.
    ///
    /// Attach targets with [`Orchestrator::with_store`] and [`Orchestrator::with_index`].
    pub fn new(
        source: Arc<dyn CatalogSource>,
        processor: ProductProcessor,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            source,
            processor,
            upsert: BulkUpsertEngine::new(),
            store: None,
            importer: None,
            reporter: None,
            config,
            shutdown_tx,
        }
    }

    /// Write normalized products to `store` through `upsert`.
    pub fn with_store(mut self, store: Box<dyn ProductStore>, upsert: BulkUpsertEngine) -> Self {
        self.store = Some(store);
        self.upsert = upsert;
        self
    }

    /// Import projected documents through `importer`.
    pub fn with_index(mut self, importer: IndexImportEngine) -> Self {
        self.importer = Some(importer);
        self
    }

    /// Write debug artifacts through `reporter`.
    pub fn with_reporter(mut self, reporter: DebugReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// A handle that cancels the run when sent to.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run the pipeline to completion.
    ///
    /// Cancellation through [`Orchestrator::shutdown`] is observed while
    /// fetching and while pacing; a page that is being written finishes first.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - When pagination ended or the page cap was reached
    /// * `Err(PipelineError)` - On a fatal error or cancellation; the summary
    ///   up to that point has been logged
    #[instrument(skip(self), fields(start_page = self.config.start_page, max_pages = self.config.max_pages, dry_run = self.config.dry_run))]
    pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
        info!("Starting product indexer orchestrator");

        let started = Instant::now();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut summary = RunSummary::new(self.config.start_page, self.config.dry_run);
        // Raw failures are only needed for the debug error report.
        let mut import_report = self.reporter.is_some().then(ImportReport::default);
        let mut streak: u32 = 0;
        let mut state = DriverState::Idle;

        let outcome = loop {
            state = match state {
                DriverState::Idle => match self.prepare(&mut summary).await {
                    Ok(()) => DriverState::Fetching {
                        page: self.config.start_page,
                    },
                    Err(e) => DriverState::Fatal(e),
                },

                DriverState::Fetching { page } => {
                    if self.page_cap_reached(page) {
                        info!(page, "Page cap reached");
                        DriverState::MaintenanceSweep
                    } else {
                        summary.last_page = Some(page);
                        self.fetch(page, &mut streak, &mut summary, &mut shutdown_rx)
                            .await
                    }
                }

                DriverState::Normalizing { page, fetched } => {
                    let processed = self
                        .processor
                        .process_batch(&fetched.records, Utc::now().timestamp());
                    summary.record_processed(&processed);

                    DriverState::Writing {
                        page,
                        has_more: fetched.has_more_after(page),
                        processed,
                    }
                }

                DriverState::Writing {
                    page,
                    processed,
                    has_more,
                } => {
                    self.write_page(page, &processed, &mut summary, &mut import_report)
                        .await;
                    summary.pages_processed += 1;

                    if !has_more {
                        info!(page, "No more pages");
                        DriverState::MaintenanceSweep
                    } else if pause(&mut shutdown_rx, self.config.page_delay).await {
                        DriverState::Fatal(PipelineError::Cancelled)
                    } else {
                        DriverState::Fetching { page: page + 1 }
                    }
                }

                DriverState::MaintenanceSweep => {
                    self.maintain(&mut summary).await;
                    DriverState::Done
                }

                DriverState::Done => break Ok(()),
                DriverState::Fatal(e) => break Err(e),
            };
        };

        summary.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.finish_report(&summary, import_report.as_ref());
        summary.log();

        match outcome {
            Ok(()) => {
                info!("Orchestrator run complete");
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "Orchestrator run aborted");
                Err(e)
            }
        }
    }

    /// Initial stats and index bootstrap.
    async fn prepare(&mut self, summary: &mut RunSummary) -> Result<(), PipelineError> {
        if let Some(store) = self.store.as_deref_mut() {
            match store.stats().await {
                Ok(stats) => {
                    info!(
                        products = stats.products,
                        active = stats.active_products,
                        images = stats.images,
                        attributes = stats.attributes,
                        "Store stats before run"
                    );
                    summary.initial_stats = Some(stats);
                }
                Err(e) => warn!(error = %e, "Could not read store stats"),
            }
        }

        if self.config.dry_run {
            info!("Dry run: no writes will be made");
            return Ok(());
        }

        if let Some(importer) = &self.importer {
            let client = importer.client();
            if !client.health_check().await? {
                warn!("Search cluster health is not green or yellow");
            }
            client.ensure_index_exists().await?;
        }

        Ok(())
    }

    fn page_cap_reached(&self, page: u32) -> bool {
        self.config.max_pages > 0
            && u64::from(page) >= u64::from(self.config.start_page) + u64::from(self.config.max_pages)
    }

    /// One fetch and the state it leads to.
    async fn fetch(
        &mut self,
        page: u32,
        streak: &mut u32,
        summary: &mut RunSummary,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> DriverState {
        let result = tokio::select! {
            result = self.source.fetch_page(page) => result,
            _ = shutdown_rx.recv() => {
                info!(page, "Received shutdown signal");
                return DriverState::Fatal(PipelineError::Cancelled);
            }
        };

        match result {
            Ok(fetched) => {
                *streak = 0;
                info!(page, records = fetched.records.len(), page_count = ?fetched.page_count, "Fetched page");
                self.log_event(
                    "page_fetched",
                    json!({ "page": page, "records": fetched.records.len(), "page_count": fetched.page_count }),
                );
                summary.records_fetched += fetched.records.len();

                if fetched.is_empty() {
                    info!(page, "Empty page, stopping");
                    DriverState::MaintenanceSweep
                } else {
                    DriverState::Normalizing { page, fetched }
                }
            }
            Err(e) => {
                *streak += 1;
                summary.fetch_errors += 1;
                error!(page, streak = *streak, error = %e, "Failed to fetch page");
                self.log_event(
                    "fetch_failed",
                    json!({ "page": page, "attempts": e.attempts, "error": e.cause, "streak": *streak }),
                );

                if *streak > self.config.max_consecutive_errors {
                    DriverState::Fatal(PipelineError::TooManyConsecutiveErrors {
                        streak: *streak,
                        page,
                    })
                } else if pause(shutdown_rx, self.config.error_delay).await {
                    DriverState::Fatal(PipelineError::Cancelled)
                } else {
                    DriverState::Fetching { page: page + 1 }
                }
            }
        }
    }

    /// Write one page to the store and the index concurrently.
    async fn write_page(
        &mut self,
        page: u32,
        processed: &ProcessedPage,
        summary: &mut RunSummary,
        import_report: &mut Option<ImportReport>,
    ) {
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.add_samples(&processed.documents);
        }

        if self.config.dry_run {
            debug!(
                page,
                products = processed.products.len(),
                documents = processed.documents.len(),
                "Dry run, skipping writes"
            );
            return;
        }

        let upsert = &self.upsert;
        let store = self.store.as_deref_mut();
        let importer = self.importer.as_ref();
        let products = processed.products.as_slice();
        let documents = processed.documents.as_slice();

        let (upserted, imported) = tokio::join!(
            async move {
                match store {
                    Some(store) if !products.is_empty() => {
                        Some(upsert.bulk_upsert(store, products).await)
                    }
                    _ => None,
                }
            },
            async move {
                match importer {
                    Some(importer) if !documents.is_empty() => Some(importer.import(documents).await),
                    _ => None,
                }
            },
        );

        if let Some(upserted) = upserted {
            summary.record_upsert(upserted);
        }
        if let Some(imported) = imported {
            summary.record_import(&imported);
            if let Some(report) = import_report.as_mut() {
                report.merge_limited(imported, MAX_REPORTED_FAILURES);
            }
        }

        let page_summary = json!({
            "page": page,
            "inserted": upserted.map(|u| u.inserted),
            "updated": upserted.map(|u| u.updated),
            "upsert_errors": upserted.map(|u| u.errors),
            "transform_failures": processed.failures.len(),
        });
        self.log_event("page_written", page_summary);
    }

    /// Run the maintenance sweep, if a store is attached and anything was requested.
    async fn maintain(&mut self, summary: &mut RunSummary) {
        if !self.config.maintenance.any() {
            return;
        }
        if self.config.dry_run {
            info!("Dry run: skipping maintenance");
            return;
        }
        let Some(store) = self.store.as_deref_mut() else {
            warn!("Maintenance requested without a database; skipping");
            return;
        };

        let report = run_maintenance(store, &self.config.maintenance).await;
        if report.failures() > 0 {
            warn!(failures = report.failures(), "Maintenance finished with failures");
        }
        summary.maintenance = Some(report);
    }

    fn log_event(&mut self, event: &str, fields: serde_json::Value) {
        if let Some(reporter) = self.reporter.as_mut() {
            if let Err(e) = reporter.log_event(event, fields) {
                warn!(error = %e, event, "Failed to write debug event");
            }
        }
    }

    /// Flush debug artifacts. Failures are logged, never fatal.
    fn finish_report(&mut self, summary: &RunSummary, import_report: Option<&ImportReport>) {
        let summary_value = serde_json::to_value(summary).unwrap_or_default();
        self.log_event("run_finished", summary_value);

        let (Some(reporter), Some(import_report)) = (self.reporter.as_ref(), import_report) else {
            return;
        };
        match reporter.write_error_report(import_report) {
            Ok(path) => info!(path = %path.display(), "Wrote index error report"),
            Err(e) => warn!(error = %e, "Failed to write index error report"),
        }
        match reporter.write_samples() {
            Ok(Some(path)) => info!(path = %path.display(), "Wrote sample documents"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to write sample documents"),
        }
    }
}

/// Sleep for `delay`, returning true if shutdown was requested meanwhile.
async fn pause(shutdown_rx: &mut broadcast::Receiver<()>, delay: Duration) -> bool {
    if delay.is_zero() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = shutdown_rx.recv() => {
            info!("Received shutdown signal");
            true
        }
    }
}
