//! # Product Indexer
//!
//! Main library for the catalog product indexer.
//!
//! This crate provides the operator options, the environment configuration
//! and the wiring that turns them into a ready-to-run orchestrator.

pub mod config;

pub use config::{Dependencies, Options};

use thiserror::Error;

use product_indexer_pipeline::PipelineError;

/// Exit status used when the run was interrupted.
pub const EXIT_CANCELLED: u8 = 130;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] PipelineError),

    /// Store error.
    #[error("Store error: {0}")]
    StoreError(#[from] product_indexer_repository::StoreError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] product_indexer_repository::SearchIndexError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::PipelineError(PipelineError::Cancelled) => EXIT_CANCELLED,
            _ => 1,
        }
    }
}
