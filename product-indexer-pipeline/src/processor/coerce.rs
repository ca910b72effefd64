//! Field coercions for the loosely typed upstream payload.
//!
//! Every function here takes an optional JSON value and never fails: absent
//! or ill-typed input falls back to a default.

use serde_json::{Map, Value};

/// Look up a dotted path such as `pricing.sales_price`.
pub fn get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}

/// The first path that resolves to a non-null value.
pub fn first<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| get(value, path))
        .find(|v| !v.is_null())
}

/// Strings pass through, numbers are rendered. Empty strings count as missing.
pub fn string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn opt_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

pub fn f64_or(value: Option<&Value>, default: f64) -> f64 {
    opt_f64(value).unwrap_or(default)
}

/// Integers pass through; floats and numeric strings are truncated toward zero.
pub fn opt_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
        }
        _ => None,
    }
}

pub fn i64_or(value: Option<&Value>, default: i64) -> i64 {
    opt_i64(value).unwrap_or(default)
}

fn float_to_i64(n: f64) -> Option<i64> {
    if n.is_finite() && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(n.trunc() as i64)
    } else {
        None
    }
}

/// Truthiness as the upstream producers mean it: `false`, `0`, `""` and
/// null are false, everything else is true.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Non-array input becomes an empty array.
pub fn array(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Non-object input becomes an empty object.
pub fn object(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

/// Integer arrays keep the elements that coerce to integers.
pub fn int_array(value: Option<&Value>) -> Vec<i64> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| opt_i64(Some(v))).collect(),
        _ => Vec::new(),
    }
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
