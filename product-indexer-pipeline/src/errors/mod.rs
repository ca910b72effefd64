//! Error types for the product indexer pipeline.

use serde::Serialize;
use thiserror::Error;

use product_indexer_repository::{SearchIndexError, StoreError};

/// A page that could not be fetched after every retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to fetch page {page} after {attempts} attempts: {cause}")]
pub struct FetchError {
    pub page: u32,
    pub attempts: u32,
    pub cause: String,
}

impl FetchError {
    pub fn new(page: u32, attempts: u32, cause: impl Into<String>) -> Self {
        Self {
            page,
            attempts,
            cause: cause.into(),
        }
    }
}

/// Which transformation rejected a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStage {
    Normalize,
    Project,
}

/// A raw record that could not be turned into a row or a document.
///
/// The record is skipped; the error ends up in the run summary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Failed to transform record {record_id}: {reason}")]
pub struct TransformError {
    /// The record's `id` as it appeared upstream, or `"<unknown>"`.
    pub record_id: String,
    pub stage: TransformStage,
    pub reason: String,
}

impl TransformError {
    pub fn normalize(record_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            stage: TransformStage::Normalize,
            reason: reason.into(),
        }
    }

    pub fn project(record_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            stage: TransformStage::Project,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur in the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source error: {0}")]
    SourceError(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Search index error: {0}")]
    Search(#[from] SearchIndexError),

    #[error("Too many consecutive errors: {streak} failed fetches, last at page {page}")]
    TooManyConsecutiveErrors { streak: u32, page: u32 },

    #[error("Pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Create a source setup error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }
}
