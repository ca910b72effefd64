//! Dependency initialization and wiring for the product indexer.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Options;
use crate::IndexingError;
use product_indexer_pipeline::{
    consumer::{CatalogApiClient, SourceConfig},
    loader::{BulkUpsertEngine, IndexImportEngine},
    orchestrator::Orchestrator,
    processor::{ProcessorConfig, ProductProcessor},
    report::DebugReporter,
};
use product_indexer_repository::{
    MySqlProductStore, OpenSearchClient, ProductStore, SearchIndexConfig, StoreConfig,
    StoreStats,
};

/// Default catalog request timeout, in seconds.
const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 30;

/// Default attempts per catalog page.
const DEFAULT_CATALOG_MAX_RETRIES: u32 = 3;

/// Default base backoff between catalog attempts, in milliseconds.
const DEFAULT_CATALOG_RETRY_DELAY_MS: u64 = 1000;

/// Default database connect and statement timeout, in seconds.
const DEFAULT_DATABASE_TIMEOUT_SECS: u64 = 60;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default product index name.
const DEFAULT_OPENSEARCH_INDEX: &str = "products";

/// Directory for debug artifacts.
const DEBUG_DIR: &str = "logs";

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Connect to the database alone and read its row counts.
    ///
    /// Used by `--stats-only`, which never fetches, so neither the catalog
    /// client nor the search index is configured.
    pub async fn store_stats(options: &Options) -> Result<StoreStats, IndexingError> {
        options.validate()?;
        if !options.stats_only {
            return Err(IndexingError::config("store statistics need --stats-only"));
        }

        let mut store = connect_store().await?;
        Ok(store.stats().await?)
    }

    /// Initialize all dependencies for a run from the options and
    /// environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CATALOG_API_URL`: Catalog endpoint (required)
    /// - `CATALOG_API_TIMEOUT_SECS`: Per-request timeout (default: 30)
    /// - `CATALOG_API_MAX_RETRIES`: Attempts per page (default: 3)
    /// - `CATALOG_API_RETRY_DELAY_MS`: Base backoff (default: 1000)
    /// - `CATALOG_USER_AGENT`: User agent sent to the catalog
    /// - `DATABASE_URL`: MySQL URL (required unless `--skip-database`)
    /// - `DATABASE_TIMEOUT_SECS`: Connect and statement timeout (default: 60)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_INDEX`: Product index name (default: products)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If configuration is invalid or the database
    ///   cannot be reached
    pub async fn new(options: &Options) -> Result<Self, IndexingError> {
        options.validate()?;
        if options.stats_only {
            return Err(IndexingError::config(
                "--stats-only does not run the pipeline; use Dependencies::store_stats",
            ));
        }

        let write_store = !options.skip_database;
        let write_index = !options.skip_index;

        info!(
            write_store,
            write_index,
            dry_run = options.dry_run,
            "Initializing dependencies"
        );

        let source_config = source_config(options)?;
        let source = CatalogApiClient::new(source_config)?;

        let processor = ProductProcessor::with_config(ProcessorConfig {
            normalize: write_store,
            project: write_index || options.debug,
        });

        let mut orchestrator =
            Orchestrator::new(Arc::new(source), processor, options.orchestrator());

        if write_store {
            let store = connect_store().await?;
            orchestrator = orchestrator.with_store(
                Box::new(store),
                BulkUpsertEngine::with_config(options.upsert()),
            );
        }

        if write_index {
            let opensearch_url = var_or("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL);
            let index_name = var_or("OPENSEARCH_INDEX", DEFAULT_OPENSEARCH_INDEX);

            info!(opensearch_url = %opensearch_url, index = %index_name, "Configuring search index");

            let search_client = OpenSearchClient::new(
                SearchIndexConfig::new(opensearch_url)
                    .with_index_name(index_name)
                    .with_max_batch_size(options.index_batch_size),
            )?;

            orchestrator = orchestrator.with_index(IndexImportEngine::with_config(
                Arc::new(search_client),
                options.import(),
            ));
        }

        if options.debug {
            let reporter = DebugReporter::new(DEBUG_DIR)?;
            info!(path = %reporter.log_path().display(), "Debug reporting enabled");
            orchestrator = orchestrator.with_reporter(reporter);
        }

        Ok(Self { orchestrator })
    }
}

async fn connect_store() -> Result<MySqlProductStore, IndexingError> {
    let database_url = required_var("DATABASE_URL")?;
    let timeout = Duration::from_secs(parse_var(
        "DATABASE_TIMEOUT_SECS",
        DEFAULT_DATABASE_TIMEOUT_SECS,
    )?);

    // Never log the URL: it carries credentials.
    let store =
        MySqlProductStore::connect(&StoreConfig::new(database_url).with_timeout(timeout)).await?;
    info!("Database connection established");
    Ok(store)
}

fn source_config(options: &Options) -> Result<SourceConfig, IndexingError> {
    let mut config = SourceConfig::new(required_var("CATALOG_API_URL")?);
    config.page_size = options.api_page_size;
    config.timeout = Duration::from_secs(parse_var(
        "CATALOG_API_TIMEOUT_SECS",
        DEFAULT_CATALOG_TIMEOUT_SECS,
    )?);
    config.max_retries = parse_var("CATALOG_API_MAX_RETRIES", DEFAULT_CATALOG_MAX_RETRIES)?;
    config.retry_delay = Duration::from_millis(parse_var(
        "CATALOG_API_RETRY_DELAY_MS",
        DEFAULT_CATALOG_RETRY_DELAY_MS,
    )?);
    if let Ok(user_agent) = env::var("CATALOG_USER_AGENT") {
        config.user_agent = user_agent;
    }

    info!(
        url = %config.base_url,
        page_size = config.page_size,
        max_retries = config.max_retries,
        "Catalog source configured"
    );
    Ok(config)
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required_var(name: &str) -> Result<String, IndexingError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(IndexingError::config(format!("{} is not set", name))),
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, IndexingError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| IndexingError::config(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Options {
        Options::try_parse_from(std::iter::once("product-indexer").chain(args.iter().copied()))
            .unwrap()
    }

    fn error_message<T>(result: Result<T, IndexingError>) -> String {
        match result {
            Ok(_) => panic!("expected an error"),
            Err(e) => e.to_string(),
        }
    }

    #[tokio::test]
    async fn test_stats_only_skips_catalog_setup() {
        env::remove_var("CATALOG_API_URL");
        env::remove_var("DATABASE_URL");

        let message = error_message(Dependencies::store_stats(&parse(&["--stats-only"])).await);
        assert!(message.contains("DATABASE_URL"), "{}", message);
        assert!(!message.contains("CATALOG_API_URL"), "{}", message);
    }

    #[tokio::test]
    async fn test_run_requires_catalog_url() {
        env::remove_var("CATALOG_API_URL");

        let options = parse(&["--skip-database", "--skip-index"]);
        let message = error_message(Dependencies::new(&options).await);
        assert!(message.contains("CATALOG_API_URL"), "{}", message);
    }

    #[tokio::test]
    async fn test_paths_do_not_mix() {
        let message = error_message(Dependencies::new(&parse(&["--stats-only"])).await);
        assert!(message.contains("--stats-only"), "{}", message);

        let message = error_message(Dependencies::store_stats(&parse(&[])).await);
        assert!(message.contains("--stats-only"), "{}", message);
    }

    #[test]
    fn test_parse_var() {
        env::set_var("PRODUCT_INDEXER_TEST_RETRIES", " 7 ");
        assert_eq!(parse_var("PRODUCT_INDEXER_TEST_RETRIES", 3u32).unwrap(), 7);

        env::set_var("PRODUCT_INDEXER_TEST_BAD", "seven");
        assert!(parse_var("PRODUCT_INDEXER_TEST_BAD", 3u32).is_err());

        assert_eq!(parse_var("PRODUCT_INDEXER_TEST_UNSET", 3u32).unwrap(), 3);
    }

    #[test]
    fn test_required_var() {
        env::set_var("PRODUCT_INDEXER_TEST_BLANK", "  ");
        assert!(required_var("PRODUCT_INDEXER_TEST_BLANK").is_err());
        assert!(required_var("PRODUCT_INDEXER_TEST_MISSING").is_err());

        env::set_var("PRODUCT_INDEXER_TEST_URL", "http://catalog.local/products");
        assert_eq!(
            required_var("PRODUCT_INDEXER_TEST_URL").unwrap(),
            "http://catalog.local/products"
        );
    }
}
