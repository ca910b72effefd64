//! Operator options.

use std::time::Duration;

use clap::Parser;

use crate::IndexingError;
use product_indexer_pipeline::loader::{ImportConfig, UpsertConfig};
use product_indexer_pipeline::orchestrator::{MaintenanceConfig, OrchestratorConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "product-indexer")]
#[command(about = "Ingest the product catalog into the database and the search index", long_about = None)]
pub struct Options {
    /// Pages to fetch; 0 fetches until the catalog is exhausted
    #[arg(long, default_value_t = 1)]
    pub max_pages: u32,

    /// First page to fetch (1-based)
    #[arg(long, default_value_t = 1)]
    pub start_page: u32,

    /// Products per database transaction
    #[arg(long, default_value_t = 50)]
    pub batch_size: usize,

    /// Records requested per catalog page
    #[arg(long, default_value_t = 100)]
    pub api_page_size: u32,

    /// Documents per search index request
    #[arg(long, default_value_t = 100)]
    pub index_batch_size: usize,

    /// Pause between pages, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub page_delay_ms: u64,

    /// Refresh facet counts after the run
    #[arg(long)]
    pub update_facets: bool,

    /// Remove inactive products not updated recently
    #[arg(long)]
    pub cleanup_old: bool,

    /// Age in days after which inactive products are removed
    #[arg(long, default_value_t = 30)]
    pub cleanup_days: u32,

    /// Optimize the product tables after the run
    #[arg(long)]
    pub optimize_tables: bool,

    /// Print database statistics and exit
    #[arg(long)]
    pub stats_only: bool,

    /// Fetch and transform without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write debug artifacts under ./logs
    #[arg(long)]
    pub debug: bool,

    /// Do not write to the database
    #[arg(long)]
    pub skip_database: bool,

    /// Do not write to the search index
    #[arg(long)]
    pub skip_index: bool,
}

impl Options {
    /// Reject option combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), IndexingError> {
        if self.start_page < 1 {
            return Err(IndexingError::config("--start-page must be at least 1"));
        }
        if self.batch_size < 1 {
            return Err(IndexingError::config("--batch-size must be at least 1"));
        }
        if self.api_page_size < 1 {
            return Err(IndexingError::config("--api-page-size must be at least 1"));
        }
        if self.index_batch_size < 1 {
            return Err(IndexingError::config("--index-batch-size must be at least 1"));
        }
        if self.stats_only && self.skip_database {
            return Err(IndexingError::config(
                "--stats-only needs the database; drop --skip-database",
            ));
        }
        Ok(())
    }

    pub fn maintenance(&self) -> MaintenanceConfig {
        MaintenanceConfig {
            cleanup_old: self.cleanup_old,
            cleanup_days: self.cleanup_days,
            update_facets: self.update_facets,
            optimize_tables: self.optimize_tables,
        }
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            start_page: self.start_page,
            max_pages: self.max_pages,
            page_delay: Duration::from_millis(self.page_delay_ms),
            dry_run: self.dry_run,
            maintenance: self.maintenance(),
            ..OrchestratorConfig::default()
        }
    }

    pub fn upsert(&self) -> UpsertConfig {
        UpsertConfig {
            chunk_size: self.batch_size,
            ..UpsertConfig::default()
        }
    }

    pub fn import(&self) -> ImportConfig {
        ImportConfig {
            batch_size: self.index_batch_size,
            ..ImportConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Options {
        Options::try_parse_from(std::iter::once("product-indexer").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let options = parse(&[]);

        assert_eq!(options.max_pages, 1);
        assert_eq!(options.start_page, 1);
        assert_eq!(options.batch_size, 50);
        assert_eq!(options.api_page_size, 100);
        assert_eq!(options.index_batch_size, 100);
        assert_eq!(options.cleanup_days, 30);
        assert!(!options.dry_run);
        assert!(!options.maintenance().any());
        assert!(options.validate().is_ok());

        let config = options.orchestrator();
        assert_eq!(config.page_delay, Duration::from_millis(100));
        assert_eq!(config.max_consecutive_errors, 5);
    }

    #[test]
    fn test_flags_flow_into_configs() {
        let options = parse(&[
            "--max-pages",
            "0",
            "--start-page",
            "4",
            "--batch-size",
            "10",
            "--index-batch-size",
            "25",
            "--cleanup-old",
            "--cleanup-days",
            "7",
            "--update-facets",
            "--dry-run",
        ]);

        let config = options.orchestrator();
        assert_eq!(config.max_pages, 0);
        assert_eq!(config.start_page, 4);
        assert!(config.dry_run);
        assert!(config.maintenance.cleanup_old);
        assert_eq!(config.maintenance.cleanup_days, 7);
        assert!(config.maintenance.update_facets);
        assert!(!config.maintenance.optimize_tables);
        assert_eq!(options.upsert().chunk_size, 10);
        assert_eq!(options.import().batch_size, 25);
    }

    #[test]
    fn test_validation() {
        assert!(parse(&["--start-page", "0"]).validate().is_err());
        assert!(parse(&["--batch-size", "0"]).validate().is_err());
        assert!(parse(&["--index-batch-size", "0"]).validate().is_err());
        assert!(parse(&["--stats-only", "--skip-database"]).validate().is_err());
        assert!(parse(&["--stats-only"]).validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_pages() {
        let parsed = Options::try_parse_from(["product-indexer", "--max-pages", "-1"]);
        assert!(parsed.is_err());
    }
}
