//! # Product Indexer Pipeline
//!
//! This crate provides the pipeline components for pulling product records
//! from the upstream catalog API, writing them to the relational store and
//! projecting them into the search index.
//!
//! ## Architecture
//!
//! The pipeline follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Fetches pages of raw records from the catalog API
//! 2. **Processor**: Normalizes records into product rows and index documents
//! 3. **Loader**: Upserts rows in chunked transactions and imports documents in batches
//! 4. **Orchestrator**: Drives pagination, error limits, maintenance and the run summary

pub mod consumer;
pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod report;

#[cfg(test)]
mod test_support;

pub use errors::{FetchError, PipelineError, TransformError};
