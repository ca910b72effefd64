//! Maintenance sweep run after the page loop.
//!
//! Each task runs independently; a failing task is recorded and the sweep
//! moves on.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{error, info, instrument};

use product_indexer_repository::{ProductStore, MAINTAINED_TABLES};

/// Which maintenance tasks to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceConfig {
    /// Delete inactive products not updated for `cleanup_days`.
    pub cleanup_old: bool,
    pub cleanup_days: u32,
    /// Call the stored facet aggregator.
    pub update_facets: bool,
    /// `OPTIMIZE TABLE` on every maintained table.
    pub optimize_tables: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            cleanup_old: false,
            cleanup_days: 30,
            update_facets: false,
            optimize_tables: false,
        }
    }
}

impl MaintenanceConfig {
    pub fn any(&self) -> bool {
        self.cleanup_old || self.update_facets || self.optimize_tables
    }
}

/// Result of one maintenance task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed { detail: Option<String> },
    Failed { error: String },
}

impl TaskOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcomes of the tasks that were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub cleanup: Option<TaskOutcome>,
    pub facets: Option<TaskOutcome>,
    pub optimize: BTreeMap<String, TaskOutcome>,
}

impl MaintenanceReport {
    pub fn failures(&self) -> usize {
        let single = [&self.cleanup, &self.facets]
            .into_iter()
            .flatten()
            .filter(|outcome| outcome.is_failed())
            .count();
        single + self.optimize.values().filter(|o| o.is_failed()).count()
    }
}

/// Run the requested tasks in order: cleanup, facet refresh, optimization.
#[instrument(skip(store))]
pub async fn run_maintenance(
    store: &mut dyn ProductStore,
    config: &MaintenanceConfig,
) -> MaintenanceReport {
    let mut report = MaintenanceReport::default();

    if config.cleanup_old {
        let outcome = match store.cleanup_inactive(config.cleanup_days).await {
            Ok(removed) => {
                info!(removed, days = config.cleanup_days, "Removed inactive products");
                TaskOutcome::Completed {
                    detail: Some(format!("removed {} products", removed)),
                }
            }
            Err(e) => {
                error!(error = %e, "Cleanup of inactive products failed");
                TaskOutcome::Failed { error: e.to_string() }
            }
        };
        report.cleanup = Some(outcome);
    }

    if config.update_facets {
        let outcome = match store.update_facets().await {
            Ok(()) => {
                info!("Refreshed facet counts");
                TaskOutcome::Completed { detail: None }
            }
            Err(e) => {
                error!(error = %e, "Facet refresh failed");
                TaskOutcome::Failed { error: e.to_string() }
            }
        };
        report.facets = Some(outcome);
    }

    if config.optimize_tables {
        for table in MAINTAINED_TABLES {
            let outcome = match store.optimize_table(table).await {
                Ok(()) => {
                    info!(table, "Optimized table");
                    TaskOutcome::Completed { detail: None }
                }
                Err(e) => {
                    error!(table, error = %e, "Table optimization failed");
                    TaskOutcome::Failed { error: e.to_string() }
                }
            };
            report.optimize.insert(table.to_string(), outcome);
        }
    }

    report
}
