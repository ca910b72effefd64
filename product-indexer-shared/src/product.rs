//! Relational product types.
//!
//! A [`NormalizedProduct`] is the unit handed to the upsert engine: one
//! `products` row plus the child rows it exclusively owns.

use serde::{Deserialize, Serialize};

/// Maximum length of `product_attributes.attribute_name`.
pub const ATTRIBUTE_NAME_MAX_CHARS: usize = 100;

/// Maximum length of `product_attributes.attribute_value`.
pub const ATTRIBUTE_VALUE_MAX_CHARS: usize = 500;

/// Volumetric keys copied from `volumetries[0]` into `product_attributes`.
pub const VOLUMETRIC_FIELDS: [&str; 5] = ["height", "width", "depth", "weight", "volumetric_weight"];

/// One row of the `products` table.
///
/// `updated_at` is not carried here; the store sets it on every write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: Option<String>,
    pub brand: Option<String>,

    pub sales_price: f64,
    pub list_price: f64,
    pub shipping_cost: f64,
    pub percentage_discount: f64,

    pub stock: i64,
    /// 1 when the upstream record is active, else 0.
    pub status: u8,
    pub visible: u8,

    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub category_lvl0: Option<String>,
    pub category_lvl1: Option<String>,
    pub category_lvl2: Option<String>,
    pub category_path: String,

    pub store_id: Option<String>,
    pub store_name: Option<String>,
    pub store_logo: Option<String>,
    pub store_rating: Option<f64>,
    pub store_authorized: bool,

    pub digital: bool,
    pub big_ticket: bool,
    pub back_order: bool,
    pub is_store_pickup: bool,
    pub super_express: bool,
    pub is_store_only: bool,
    pub shipping_days: Option<i64>,

    pub review_rating: Option<f64>,
    pub total_reviews: i64,

    pub main_image: Option<String>,
    pub thumbnail: Option<String>,

    pub fulfillment_type: Option<String>,
    pub relevance_score: f64,
}

/// One row of `product_images`. The primary picture lives on the parent row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub product_id: i64,
    pub image_url: String,
    pub thumbnail_url: String,
    /// 1-based position in the upstream `pictures` array (so always >= 2 here).
    pub image_order: i32,
}

/// One row of `product_attributes`, used for both descriptive and volumetric attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub product_id: i64,
    pub attribute_name: String,
    pub attribute_value: String,
}

impl ProductAttribute {
    /// Build an attribute row, truncating name and value to the column limits.
    pub fn new(product_id: i64, name: &str, value: &str) -> Self {
        Self {
            product_id,
            attribute_name: name.chars().take(ATTRIBUTE_NAME_MAX_CHARS).collect(),
            attribute_value: value.chars().take(ATTRIBUTE_VALUE_MAX_CHARS).collect(),
        }
    }
}

/// A product row together with the child rows rewritten alongside it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedProduct {
    pub product: ProductRow,
    pub images: Vec<ProductImage>,
    pub attributes: Vec<ProductAttribute>,
    pub volumetrics: Vec<ProductAttribute>,
}

impl NormalizedProduct {
    /// The product's primary key.
    pub fn id(&self) -> i64 {
        self.product.id
    }

    /// All rows destined for `product_attributes`, descriptive first.
    pub fn all_attributes(&self) -> impl Iterator<Item = &ProductAttribute> {
        self.attributes.iter().chain(self.volumetrics.iter())
    }
}
