//! Search index document types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Three-level category path, each level a `" > "`-joined prefix of the next.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HierarchicalCategory {
    pub lvl0: Option<String>,
    pub lvl1: Option<String>,
    pub lvl2: Option<String>,
}

impl HierarchicalCategory {
    /// Separator between levels of a category path.
    pub const SEPARATOR: &'static str = " > ";

    /// Build the hierarchy from path components ordered from root to leaf.
    ///
    /// Missing deeper levels repeat the deepest known level, so `lvl1` is
    /// either `lvl0` or starts with `lvl0 > `, and likewise for `lvl2`.
    pub fn from_components(components: &[String]) -> Self {
        if components.is_empty() {
            return Self::default();
        }

        let depth = |n: usize| components[..n.min(components.len())].join(Self::SEPARATOR);

        Self {
            lvl0: Some(depth(1)),
            lvl1: Some(depth(2)),
            lvl2: Some(depth(3)),
        }
    }

    /// The deepest level, or an empty string when there is no category.
    pub fn path(&self) -> String {
        self.lvl2
            .clone()
            .or_else(|| self.lvl1.clone())
            .or_else(|| self.lvl0.clone())
            .unwrap_or_default()
    }

    /// True when no level is set.
    pub fn is_empty(&self) -> bool {
        self.lvl0.is_none() && self.lvl1.is_none() && self.lvl2.is_none()
    }
}

/// A product as stored in the search index.
///
/// Field names follow the index schema exactly, including `objectID` and the
/// flat `hierarchical_category.lvlN` duplicates of the nested object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub product_id: i64,
    pub external_id: String,
    pub title: String,
    pub title_seo: String,
    pub stock: i64,
    pub is_active: bool,
    pub sale_price: f64,
    /// Unix seconds at projection time.
    pub indexing_date: i64,
    pub relevance_score: f64,

    pub ean: Option<String>,
    pub sku: Option<String>,
    pub division: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
    pub relevance_sales: Option<f64>,
    pub relevance_amount: Option<f64>,
    pub wallet: bool,
    pub home: bool,
    pub cs_months: Vec<i64>,

    pub seller: Map<String, Value>,
    pub pricing: Map<String, Value>,
    pub shipping: Map<String, Value>,
    pub rating: Map<String, Value>,
    pub features: Map<String, Value>,
    pub pictures: Vec<Value>,
    pub photos: Vec<Value>,
    pub attributes: Vec<Value>,
    pub categories: Vec<Value>,
    pub videos: Vec<Value>,
    pub volumetries: Vec<Value>,

    pub is_store_only: bool,
    pub is_store_pickup: bool,
    pub is_backorder: bool,
    pub is_big_ticket: bool,
    pub super_express: bool,
    pub digital: bool,

    pub presale_date: Option<String>,
    pub fulfillment_id: Option<String>,
    pub extended_catalogue_days: Option<i64>,
    pub warranties: Map<String, Value>,
    pub price: Option<f64>,
    pub percent_off: Option<f64>,
    pub fulfillment: bool,
    pub has_free_shipping: bool,
    pub store_only: bool,
    pub store_pickup: bool,

    pub hierarchical_category: HierarchicalCategory,
    #[serde(rename = "hierarchical_category.lvl0")]
    pub hierarchical_category_lvl0: Option<String>,
    #[serde(rename = "hierarchical_category.lvl1")]
    pub hierarchical_category_lvl1: Option<String>,
    #[serde(rename = "hierarchical_category.lvl2")]
    pub hierarchical_category_lvl2: Option<String>,

    pub sellers: Vec<Value>,
    pub review_rating: Option<f64>,
    pub total_reviews: Option<i64>,
    pub store_rating: Option<f64>,
    pub ccs_months: Vec<i64>,
    pub fecha_alta_cms: Option<i64>,
    pub temporada: Option<i64>,
    pub variations: Map<String, Value>,
}
