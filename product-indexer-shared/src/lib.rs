//! # Product Indexer Shared
//!
//! Plain data types shared between the product indexer crates: the flat
//! relational product row with its child rows, and the search index
//! document projected from the same upstream record.

pub mod document;
pub mod product;

pub use document::{HierarchicalCategory, ProductDocument};
pub use product::{
    NormalizedProduct, ProductAttribute, ProductImage, ProductRow, ATTRIBUTE_NAME_MAX_CHARS,
    ATTRIBUTE_VALUE_MAX_CHARS, VOLUMETRIC_FIELDS,
};
