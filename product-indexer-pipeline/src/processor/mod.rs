//! Processor module for the product indexer pipeline.
//!
//! Transforms raw catalog records into relational rows and index documents.

pub mod categories;
pub mod coerce;
mod fields;
mod normalizer;
mod product_processor;
mod projector;
pub mod scoring;

pub use categories::{Categories, CategoryPath};
pub use normalizer::ProductNormalizer;
pub use product_processor::{ProcessedPage, ProcessorConfig, ProductProcessor};
pub use projector::{slugify, DocumentProjector};
pub use scoring::relevance_score;
