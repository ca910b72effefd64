//! Relevance scoring.

use serde_json::Value;

use super::coerce;

/// Score every product starts from, and the fallback for unscorable input.
pub const BASE_SCORE: f64 = 50.0;

const MAX_SCORE: f64 = 100.0;
const STOCK_WEIGHT: f64 = 0.1;
const MAX_STOCK_BONUS: f64 = 5.0;
const RATING_WEIGHT: f64 = 2.0;
const ACTIVE_BONUS: f64 = 5.0;
const SUPER_EXPRESS_BONUS: f64 = 10.0;
const FREE_SHIPPING_BONUS: f64 = 5.0;

/// Deterministic relevance score in `[0, 100]`, rounded to two decimals.
pub fn relevance_score(raw: &Value) -> f64 {
    let stock = coerce::f64_or(raw.get("stock"), 0.0).max(0.0);

    let mut score = BASE_SCORE;
    score += (stock * STOCK_WEIGHT).min(MAX_STOCK_BONUS);
    score += coerce::f64_or(coerce::get(raw, "rating.average_score"), 0.0) * RATING_WEIGHT;
    if coerce::truthy(raw.get("is_active")) {
        score += ACTIVE_BONUS;
    }
    if coerce::truthy(coerce::get(raw, "features.super_express")) {
        score += SUPER_EXPRESS_BONUS;
    }
    if coerce::truthy(coerce::get(raw, "shipping.is_free")) {
        score += FREE_SHIPPING_BONUS;
    }

    let rounded = (score * 100.0).round() / 100.0;
    if !rounded.is_finite() {
        return BASE_SCORE;
    }
    rounded.clamp(0.0, MAX_SCORE)
}
