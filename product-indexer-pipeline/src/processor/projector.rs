//! Document projector: one raw record to a search index document.

use serde_json::{Map, Value};

use super::categories;
use super::coerce::{self, get};
use super::fields::{self, FeatureFlags};
use super::scoring::relevance_score;
use crate::errors::TransformError;
use product_indexer_shared::ProductDocument;

/// Maximum length of the projected `title`.
pub const TITLE_MAX_CHARS: usize = 500;
/// Maximum length of the projected `short_description`.
pub const SHORT_DESCRIPTION_MAX_CHARS: usize = 1000;
/// Maximum length of `title_seo`.
pub const SLUG_MAX_CHARS: usize = 100;
/// `title_seo` for records without a usable title.
pub const DEFAULT_SLUG: &str = "producto";

/// Maps raw catalog records to [`ProductDocument`]s.
#[derive(Debug, Clone, Default)]
pub struct DocumentProjector;

impl DocumentProjector {
    pub fn new() -> Self {
        Self
    }

    /// Project one raw record.
    ///
    /// # Arguments
    ///
    /// * `raw` - The upstream record
    /// * `indexing_date` - Unix seconds to stamp on the document
    pub fn project(&self, raw: &Value, indexing_date: i64) -> Result<ProductDocument, TransformError> {
        if !raw.is_object() {
            return Err(TransformError::project(
                fields::record_label(raw),
                "record is not an object",
            ));
        }
        let id = fields::record_id(raw).ok_or_else(|| {
            TransformError::project(fields::record_label(raw), "missing or invalid id")
        })?;

        let external_id = coerce::string(raw.get("external_id")).unwrap_or_else(|| id.to_string());
        let raw_title = coerce::string(raw.get("title"));
        let flags = FeatureFlags::from_raw(raw);
        let category = categories::flatten(raw.get("categories"));
        let seller = coerce::object(raw.get("seller"));
        let pictures = coerce::array(raw.get("pictures"));
        let hierarchy = category.hierarchy;

        Ok(ProductDocument {
            object_id: external_id.clone(),
            product_id: id,
            external_id,
            title: raw_title
                .as_deref()
                .map(|t| coerce::truncate_chars(t, TITLE_MAX_CHARS))
                .unwrap_or_default(),
            title_seo: slugify(raw_title.as_deref()),
            stock: fields::stock(raw),
            is_active: coerce::truthy(raw.get("is_active")),
            sale_price: fields::sale_price(raw),
            indexing_date,
            relevance_score: relevance_score(raw),

            ean: coerce::string(raw.get("ean")),
            sku: coerce::string(raw.get("sku")),
            division: coerce::string(raw.get("division")),
            brand: fields::brand(raw),
            description: coerce::string(raw.get("description")),
            short_description: coerce::string(raw.get("short_description"))
                .map(|s| coerce::truncate_chars(&s, SHORT_DESCRIPTION_MAX_CHARS)),
            updated_at: coerce::string(raw.get("updated_at")),
            created_at: coerce::string(raw.get("created_at")),
            relevance_sales: coerce::opt_f64(raw.get("relevance_sales")),
            relevance_amount: coerce::opt_f64(raw.get("relevance_amount")),
            wallet: coerce::truthy(raw.get("wallet")),
            home: coerce::truthy(raw.get("home")),
            cs_months: coerce::int_array(raw.get("cs_months")),

            sellers: sellers(raw.get("seller"), &seller),
            store_rating: coerce::opt_f64(seller.get("store_rating")),
            seller,
            pricing: coerce::object(raw.get("pricing")),
            shipping: coerce::object(raw.get("shipping")),
            rating: coerce::object(raw.get("rating")),
            features: coerce::object(raw.get("features")),
            photos: pictures.clone(),
            pictures,
            attributes: coerce::array(raw.get("attributes")),
            categories: category.entries,
            videos: coerce::array(raw.get("videos")),
            volumetries: coerce::array(raw.get("volumetries")),

            is_store_only: flags.store_only,
            is_store_pickup: flags.store_pickup,
            is_backorder: flags.back_order,
            is_big_ticket: flags.big_ticket,
            super_express: flags.super_express,
            digital: flags.digital,

            presale_date: coerce::string(raw.get("presale_date")),
            fulfillment_id: coerce::string(raw.get("fulfillment_id")),
            extended_catalogue_days: coerce::opt_i64(raw.get("extended_catalogue_days")),
            warranties: coerce::object(raw.get("warranties")),
            price: coerce::opt_f64(get(raw, "pricing.list_price")),
            percent_off: coerce::opt_f64(get(raw, "pricing.percentage_discount")),
            fulfillment: flags.fulfillment,
            has_free_shipping: fields::free_shipping(raw),
            store_only: flags.store_only,
            store_pickup: flags.store_pickup,

            hierarchical_category_lvl0: hierarchy.lvl0.clone(),
            hierarchical_category_lvl1: hierarchy.lvl1.clone(),
            hierarchical_category_lvl2: hierarchy.lvl2.clone(),
            hierarchical_category: hierarchy,

            review_rating: fields::review_rating(raw),
            total_reviews: coerce::opt_i64(get(raw, "rating.total_reviews")),
            ccs_months: coerce::int_array(raw.get("ccs_months")),
            fecha_alta_cms: coerce::opt_i64(raw.get("fecha_alta_cms")),
            temporada: coerce::opt_i64(raw.get("temporada")),
            variations: coerce::object(raw.get("variations")),
        })
    }
}

/// `[seller]` when the record carries a seller object, else empty.
fn sellers(raw_seller: Option<&Value>, seller: &Map<String, Value>) -> Vec<Value> {
    match raw_seller {
        Some(Value::Object(_)) => vec![Value::Object(seller.clone())],
        _ => Vec::new(),
    }
}

/// URL slug of a title: lowercased, punctuation dropped, whitespace runs
/// joined with `-`, at most [`SLUG_MAX_CHARS`] characters.
pub fn slugify(title: Option<&str>) -> String {
    let Some(title) = title else {
        return DEFAULT_SLUG.to_string();
    };

    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let slug = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    let slug = coerce::truncate_chars(&slug, SLUG_MAX_CHARS);

    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}
