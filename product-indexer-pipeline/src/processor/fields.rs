//! Field extraction shared by the normalizer and the projector.

use serde_json::Value;

use super::coerce::{self, first, get};

/// The record's id, required by both projections.
pub fn record_id(raw: &Value) -> Option<i64> {
    coerce::opt_i64(raw.get("id"))
}

/// Best-effort id for error reports.
pub fn record_label(raw: &Value) -> String {
    raw.get("id")
        .and_then(|id| coerce::string(Some(id)))
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// `brand` as a plain string or as `{name}`.
pub fn brand(raw: &Value) -> Option<String> {
    coerce::string(raw.get("brand")).or_else(|| coerce::string(get(raw, "brand.name")))
}

pub fn sale_price(raw: &Value) -> f64 {
    coerce::f64_or(first(raw, &["pricing.sales_price", "pricing.sale_price"]), 0.0).max(0.0)
}

pub fn stock(raw: &Value) -> i64 {
    coerce::i64_or(raw.get("stock"), 0).max(0)
}

/// `rating.average_score`, falling back to `rating.average`.
pub fn review_rating(raw: &Value) -> Option<f64> {
    coerce::opt_f64(first(raw, &["rating.average_score", "rating.average"]))
}

/// Fulfillment flags, which upstream sends under `features` or at the top level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    pub digital: bool,
    pub big_ticket: bool,
    pub back_order: bool,
    pub store_pickup: bool,
    pub super_express: bool,
    pub store_only: bool,
    pub fulfillment: bool,
}

impl FeatureFlags {
    pub fn from_raw(raw: &Value) -> Self {
        let flag = |paths: &[&str]| coerce::truthy(first(raw, paths));

        Self {
            digital: flag(&["features.digital", "digital"]),
            big_ticket: flag(&["features.big_ticket", "features.is_big_ticket", "is_big_ticket"]),
            back_order: flag(&["features.back_order", "features.is_backorder", "is_backorder"]),
            store_pickup: flag(&[
                "features.is_store_pickup",
                "features.store_pickup",
                "is_store_pickup",
            ]),
            super_express: flag(&["features.super_express", "super_express"]),
            store_only: flag(&["features.is_store_only", "features.store_only", "is_store_only"]),
            fulfillment: flag(&["features.fulfillment", "fulfillment"]),
        }
    }
}

/// Delivery estimate in days, wherever upstream put it.
pub fn shipping_days(raw: &Value) -> Option<i64> {
    coerce::opt_i64(first(
        raw,
        &["shipping.days", "shipping.shipping_days", "features.shipping_days"],
    ))
}

pub fn free_shipping(raw: &Value) -> bool {
    coerce::truthy(get(raw, "shipping.is_free"))
}
