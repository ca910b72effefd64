//! Search index error types.
//!
//! This module defines the error types that can occur during search index operations.

use thiserror::Error;

use crate::types::ImportItemResult;

/// Errors that can occur during search index operations.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., missing required fields).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// The import request itself failed. When the server still reported
    /// per-document outcomes they are carried in `results`.
    #[error("Import failed: {message}")]
    ImportFailed {
        message: String,
        results: Option<Vec<ImportItemResult>>,
    },

    /// Failed to parse a response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create an import failure without per-document outcomes.
    pub fn import_failed(msg: impl Into<String>) -> Self {
        Self::ImportFailed {
            message: msg.into(),
            results: None,
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Per-document outcomes attached to a failed import, if any.
    pub fn import_results(&self) -> Option<&[ImportItemResult]> {
        match self {
            Self::ImportFailed {
                results: Some(results),
                ..
            } => Some(results),
            _ => None,
        }
    }
}
