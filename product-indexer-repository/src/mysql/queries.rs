//! SQL text for the MySQL product store.
//!
//! Statements with placeholders are sent as prepared statements; the
//! session-control statements are sent unprepared.

use std::sync::LazyLock;

/// `products` columns overwritten on every sighting, in bind order.
pub(crate) const MUTABLE_PRODUCT_COLUMNS: [&str; 35] = [
    "name",
    "description",
    "short_description",
    "sku",
    "brand",
    "sales_price",
    "list_price",
    "shipping_cost",
    "percentage_discount",
    "stock",
    "status",
    "category_id",
    "category_name",
    "category_lvl0",
    "category_lvl1",
    "category_lvl2",
    "category_path",
    "store_id",
    "store_name",
    "store_logo",
    "store_rating",
    "store_authorized",
    "digital",
    "big_ticket",
    "back_order",
    "is_store_pickup",
    "super_express",
    "is_store_only",
    "shipping_days",
    "review_rating",
    "total_reviews",
    "main_image",
    "thumbnail",
    "fulfillment_type",
    "relevance_score",
];

pub(crate) const BEGIN: &str = "START TRANSACTION";
pub(crate) const COMMIT: &str = "COMMIT";
pub(crate) const ROLLBACK: &str = "ROLLBACK";
pub(crate) const UPDATE_ALL_FACETS: &str = "CALL UpdateAllFacets()";

pub(crate) const SELECT_PRODUCT_ID: &str = "SELECT id FROM products WHERE id = ?";

/// `id`, the mutable columns and `visible`, with `updated_at` set server-side.
pub(crate) static INSERT_PRODUCT: LazyLock<String> = LazyLock::new(|| {
    let placeholders = vec!["?"; MUTABLE_PRODUCT_COLUMNS.len()].join(", ");
    format!(
        "INSERT INTO products (id, {}, visible, updated_at) VALUES (?, {}, ?, NOW())",
        MUTABLE_PRODUCT_COLUMNS.join(", "),
        placeholders
    )
});

/// The mutable columns followed by the `id` in the WHERE clause.
pub(crate) static UPDATE_PRODUCT: LazyLock<String> = LazyLock::new(|| {
    let assignments = MUTABLE_PRODUCT_COLUMNS
        .iter()
        .map(|column| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE products SET {}, updated_at = NOW() WHERE id = ?",
        assignments
    )
});

pub(crate) const DELETE_IMAGES: &str = "DELETE FROM product_images WHERE product_id = ?";
pub(crate) const INSERT_IMAGE: &str = "INSERT INTO product_images \
     (product_id, image_url, thumbnail_url, image_order) VALUES (?, ?, ?, ?)";

pub(crate) const DELETE_ATTRIBUTES: &str = "DELETE FROM product_attributes WHERE product_id = ?";
pub(crate) const INSERT_ATTRIBUTE: &str = "INSERT INTO product_attributes \
     (product_id, attribute_name, attribute_value) VALUES (?, ?, ?)";

/// Predicate shared by the cleanup statements; binds the age in days.
const STALE_INACTIVE: &str = "p.status = 0 AND p.updated_at < DATE_SUB(NOW(), INTERVAL ? DAY)";

pub(crate) static CLEANUP_IMAGES: LazyLock<String> = LazyLock::new(|| {
    format!(
        "DELETE pi FROM product_images pi JOIN products p ON p.id = pi.product_id WHERE {}",
        STALE_INACTIVE
    )
});

pub(crate) static CLEANUP_ATTRIBUTES: LazyLock<String> = LazyLock::new(|| {
    format!(
        "DELETE pa FROM product_attributes pa JOIN products p ON p.id = pa.product_id WHERE {}",
        STALE_INACTIVE
    )
});

pub(crate) static CLEANUP_PRODUCTS: LazyLock<String> =
    LazyLock::new(|| format!("DELETE p FROM products p WHERE {}", STALE_INACTIVE));

pub(crate) const COUNT_ACTIVE_PRODUCTS: &str = "SELECT COUNT(*) FROM products WHERE status = 1";

/// `SELECT COUNT(*)` over a table name taken from a fixed list.
pub(crate) fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", table)
}

/// `OPTIMIZE TABLE` over a table name taken from a fixed list.
pub(crate) fn optimize_table(table: &str) -> String {
    format!("OPTIMIZE TABLE {}", table)
}
