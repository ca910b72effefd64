//! Record normalizer: one raw record to a `products` row plus its child rows.

use serde_json::Value;

use super::categories;
use super::coerce::{self, first, get};
use super::fields::{self, FeatureFlags};
use super::scoring::relevance_score;
use crate::errors::TransformError;
use product_indexer_shared::{
    NormalizedProduct, ProductAttribute, ProductImage, ProductRow, VOLUMETRIC_FIELDS,
};

/// Maps raw catalog records to [`NormalizedProduct`]s.
#[derive(Debug, Clone, Default)]
pub struct ProductNormalizer;

impl ProductNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one raw record.
    ///
    /// Only a missing or non-integer `id` is fatal for the record; every
    /// other field falls back to its default.
    pub fn normalize(&self, raw: &Value) -> Result<NormalizedProduct, TransformError> {
        if !raw.is_object() {
            return Err(TransformError::normalize(
                fields::record_label(raw),
                "record is not an object",
            ));
        }
        let id = fields::record_id(raw).ok_or_else(|| {
            TransformError::normalize(fields::record_label(raw), "missing or invalid id")
        })?;

        let flags = FeatureFlags::from_raw(raw);
        let category = categories::flatten(raw.get("categories"));
        let pictures = coerce::array(raw.get("pictures"));
        let main_picture = pictures.first();

        let product = ProductRow {
            id,
            name: coerce::string(raw.get("title")),
            description: coerce::string(raw.get("description")),
            short_description: coerce::string(raw.get("short_description")),
            sku: coerce::string(raw.get("sku")),
            brand: fields::brand(raw),

            sales_price: fields::sale_price(raw),
            list_price: coerce::f64_or(get(raw, "pricing.list_price"), 0.0).max(0.0),
            shipping_cost: coerce::f64_or(first(raw, &["shipping.cost", "shipping.price"]), 0.0)
                .max(0.0),
            percentage_discount: coerce::f64_or(get(raw, "pricing.percentage_discount"), 0.0)
                .max(0.0),

            stock: fields::stock(raw),
            status: u8::from(coerce::truthy(raw.get("is_active"))),
            visible: 1,

            category_id: category.leaf_id.clone(),
            category_name: category.leaf_name.clone(),
            category_path: category.hierarchy.path(),
            category_lvl0: category.hierarchy.lvl0,
            category_lvl1: category.hierarchy.lvl1,
            category_lvl2: category.hierarchy.lvl2,

            store_id: coerce::string(get(raw, "seller.id")),
            store_name: coerce::string(get(raw, "seller.name")),
            store_logo: coerce::string(get(raw, "seller.logo")),
            store_rating: coerce::opt_f64(get(raw, "seller.store_rating")),
            store_authorized: coerce::truthy(get(raw, "seller.authorized")),

            digital: flags.digital,
            big_ticket: flags.big_ticket,
            back_order: flags.back_order,
            is_store_pickup: flags.store_pickup,
            super_express: flags.super_express,
            is_store_only: flags.store_only,
            shipping_days: fields::shipping_days(raw),

            review_rating: fields::review_rating(raw),
            total_reviews: coerce::i64_or(get(raw, "rating.total_reviews"), 0).max(0),

            main_image: main_picture.and_then(|p| coerce::string(p.get("source"))),
            thumbnail: main_picture
                .and_then(|p| coerce::string(first(p, &["thumbnail", "source"]))),

            fulfillment_type: coerce::string(first(
                raw,
                &["fulfillment_type", "features.fulfillment_type", "fulfillment_id"],
            )),
            relevance_score: relevance_score(raw),
        };

        Ok(NormalizedProduct {
            images: images(id, &pictures),
            attributes: attributes(id, raw.get("attributes")),
            volumetrics: volumetrics(id, raw.get("volumetries")),
            product,
        })
    }
}

/// Pictures after the first, which is stored on the parent row.
fn images(product_id: i64, pictures: &[Value]) -> Vec<ProductImage> {
    pictures
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(index, picture)| {
            let source = coerce::string(picture.get("source"))?;
            let thumbnail = coerce::string(picture.get("thumbnail")).unwrap_or_else(|| source.clone());
            Some(ProductImage {
                product_id,
                image_url: source,
                thumbnail_url: thumbnail,
                image_order: i32::try_from(index + 1).unwrap_or(i32::MAX),
            })
        })
        .collect()
}

fn attributes(product_id: i64, value: Option<&Value>) -> Vec<ProductAttribute> {
    coerce::array(value)
        .iter()
        .filter_map(|attribute| {
            let name = coerce::string(attribute.get("name"))?;
            let value = coerce::string(attribute.get("value"))?;
            Some(ProductAttribute::new(product_id, &name, &value))
        })
        .collect()
}

/// One attribute per non-empty volumetric field of `volumetries[0]`.
fn volumetrics(product_id: i64, value: Option<&Value>) -> Vec<ProductAttribute> {
    let entries = coerce::array(value);
    let Some(dimensions) = entries.first().filter(|d| d.is_object()) else {
        return Vec::new();
    };

    VOLUMETRIC_FIELDS
        .iter()
        .filter_map(|field| {
            let value = coerce::string(dimensions.get(*field))?;
            Some(ProductAttribute::new(product_id, field, &value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::shoe_record;
    use serde_json::json;

    #[test]
    fn test_single_product() {
        let normalized = ProductNormalizer::new().normalize(&shoe_record()).unwrap();
        let row = &normalized.product;

        assert_eq!(row.id, 42);
        assert_eq!(row.name.as_deref(), Some("Shoe"));
        assert_eq!(row.sales_price, 80.0);
        assert_eq!(row.list_price, 100.0);
        assert_eq!(row.percentage_discount, 20.0);
        assert_eq!(row.stock, 3);
        assert_eq!(row.status, 1);
        assert_eq!(row.visible, 1);
        assert_eq!(row.relevance_score, 78.3);
        assert_eq!(row.category_lvl0.as_deref(), Some("a"));
        assert_eq!(row.category_lvl1.as_deref(), Some("a > b"));
        assert_eq!(row.category_lvl2.as_deref(), Some("a > b > c"));
        assert_eq!(row.category_path, "a > b > c");
        assert_eq!(row.category_name.as_deref(), Some("C"));
        assert_eq!(row.main_image.as_deref(), Some("a.jpg"));
        assert_eq!(row.thumbnail.as_deref(), Some("at.jpg"));
        assert!(row.super_express);
    }

    #[test]
    fn test_child_rows() {
        let normalized = ProductNormalizer::new().normalize(&shoe_record()).unwrap();

        assert_eq!(
            normalized.images,
            vec![ProductImage {
                product_id: 42,
                image_url: "b.jpg".to_string(),
                thumbnail_url: "b.jpg".to_string(),
                image_order: 2,
            }]
        );

        let pairs: Vec<(&str, &str)> = normalized
            .all_attributes()
            .map(|a| (a.attribute_name.as_str(), a.attribute_value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Color", "Red"), ("height", "10"), ("weight", "2")]);
    }

    #[test]
    fn test_update_shape() {
        let mut raw = shoe_record();
        raw["stock"] = json!(0);
        raw["is_active"] = json!(false);

        let row = ProductNormalizer::new().normalize(&raw).unwrap().product;
        assert_eq!(row.status, 0);
        assert_eq!(row.stock, 0);
        assert_eq!(row.relevance_score, 73.0);
    }

    #[test]
    fn test_sparse_record_defaults() {
        let normalized = ProductNormalizer::new()
            .normalize(&json!({ "id": "7", "stock": -4, "pictures": "none", "categories": {} }))
            .unwrap();
        let row = &normalized.product;

        assert_eq!(row.id, 7);
        assert_eq!(row.name, None);
        assert_eq!(row.sales_price, 0.0);
        assert_eq!(row.stock, 0);
        assert_eq!(row.status, 0);
        assert_eq!(row.category_lvl0, None);
        assert_eq!(row.category_path, "");
        assert_eq!(row.main_image, None);
        assert!(normalized.images.is_empty());
        assert!(normalized.attributes.is_empty());
        assert!(normalized.volumetrics.is_empty());
    }

    #[test]
    fn test_skips_incomplete_children() {
        let raw = json!({
            "id": 1,
            "pictures": [{ "source": "main.jpg" }, { "thumbnail": "t.jpg" }, { "source": "" }, { "source": "d.jpg" }],
            "attributes": [{ "name": "Size" }, { "name": "", "value": "x" }, { "name": "Size", "value": 44 }],
            "volumetries": [{ "height": "", "depth": 3.5 }]
        });

        let normalized = ProductNormalizer::new().normalize(&raw).unwrap();

        assert_eq!(normalized.images.len(), 1);
        assert_eq!(normalized.images[0].image_url, "d.jpg");
        assert_eq!(normalized.images[0].image_order, 4);
        assert_eq!(normalized.attributes, vec![ProductAttribute::new(1, "Size", "44")]);
        assert_eq!(normalized.volumetrics, vec![ProductAttribute::new(1, "depth", "3.5")]);
    }

    #[test]
    fn test_missing_id_is_transform_error() {
        let err = ProductNormalizer::new()
            .normalize(&json!({ "title": "No id" }))
            .unwrap_err();
        assert_eq!(err.record_id, "<unknown>");

        assert!(ProductNormalizer::new().normalize(&json!([1, 2])).is_err());
    }
}
