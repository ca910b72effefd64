//! Configuration for the product indexer binary.

mod dependencies;
mod options;

pub use dependencies::Dependencies;
pub use options::Options;
