//! OpenSearch index configuration, mappings and document schema.
//!
//! This module defines the index settings and mappings for the product
//! search index, and the pre-import check that rejects documents the index
//! schema would not accept.

use serde_json::{json, Map, Value};

use crate::errors::SearchIndexError;

/// Maximum length of `title`.
pub const TITLE_MAX_CHARS: usize = 500;

/// Maximum length of `short_description`.
pub const SHORT_DESCRIPTION_MAX_CHARS: usize = 1000;

/// JSON type expected for a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Bool,
    Number,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "int",
            Self::Bool => "bool",
            Self::Number => "number",
        }
    }
}

/// Fields every document must carry; a document missing one is rejected.
pub const REQUIRED_FIELDS: [(&str, FieldKind); 10] = [
    ("objectID", FieldKind::String),
    ("product_id", FieldKind::Integer),
    ("external_id", FieldKind::String),
    ("title", FieldKind::String),
    ("title_seo", FieldKind::String),
    ("stock", FieldKind::Integer),
    ("is_active", FieldKind::Bool),
    ("sale_price", FieldKind::Number),
    ("indexing_date", FieldKind::Integer),
    ("relevance_score", FieldKind::Number),
];

/// Check a serialized document against the index schema.
///
/// The error message is what ends up as the histogram key in import
/// reports, so it names the offending field and nothing record-specific.
pub fn validate_document(document: &Value) -> Result<(), SearchIndexError> {
    let fields = document
        .as_object()
        .ok_or_else(|| SearchIndexError::validation("document is not an object"))?;

    for (name, kind) in REQUIRED_FIELDS {
        match fields.get(name) {
            None | Some(Value::Null) => {
                return Err(SearchIndexError::validation(format!(
                    "missing required field {}",
                    name
                )))
            }
            Some(value) if !kind.matches(value) => {
                return Err(SearchIndexError::validation(format!(
                    "field {} must be {}",
                    name,
                    kind.name()
                )))
            }
            Some(_) => {}
        }
    }

    let too_long = |field: &str, max: usize| {
        fields
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| s.chars().count() > max)
    };

    if too_long("title", TITLE_MAX_CHARS) {
        return Err(SearchIndexError::validation(format!(
            "field title exceeds {} characters",
            TITLE_MAX_CHARS
        )));
    }
    if too_long("short_description", SHORT_DESCRIPTION_MAX_CHARS) {
        return Err(SearchIndexError::validation(format!(
            "field short_description exceeds {} characters",
            SHORT_DESCRIPTION_MAX_CHARS
        )));
    }

    Ok(())
}

/// Get the index settings and mappings for the product search index.
///
/// The configuration includes:
/// - **text** with a keyword sub-field for title and brand
/// - **keyword** fields for ids, categories and other facets
/// - **object** fields with `enabled: false` for the upstream passthrough payloads
pub fn get_index_settings() -> Value {
    let mut properties = Map::new();
    for group in [
        required_mappings(),
        catalog_mappings(),
        passthrough_mappings(),
        flag_mappings(),
        ranking_mappings(),
    ] {
        if let Value::Object(fields) = group {
            properties.extend(fields);
        }
    }

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": { "properties": properties }
    })
}

fn required_mappings() -> Value {
    json!({
        "objectID": { "type": "keyword" },
        "product_id": { "type": "long" },
        "external_id": { "type": "keyword" },
        "title": {
            "type": "text",
            "fields": { "raw": { "type": "keyword", "ignore_above": 512 } }
        },
        "title_seo": { "type": "keyword" },
        "stock": { "type": "integer" },
        "is_active": { "type": "boolean" },
        "sale_price": { "type": "double" },
        "indexing_date": { "type": "long" },
        "relevance_score": { "type": "double" }
    })
}

fn catalog_mappings() -> Value {
    let keyword = json!({ "type": "keyword" });
    let boolean = json!({ "type": "boolean" });

    json!({
        "ean": keyword,
        "sku": keyword,
        "division": keyword,
        "brand": {
            "type": "text",
            "fields": { "raw": { "type": "keyword" } }
        },
        "description": { "type": "text" },
        "short_description": { "type": "text" },
        "updated_at": keyword,
        "created_at": keyword,
        "relevance_sales": { "type": "double" },
        "relevance_amount": { "type": "double" },
        "wallet": boolean,
        "home": boolean,
        "cs_months": { "type": "integer" },
        "ccs_months": { "type": "integer" }
    })
}

fn passthrough_mappings() -> Value {
    let passthrough = json!({ "type": "object", "enabled": false });
    let fields = [
        "seller",
        "sellers",
        "pricing",
        "shipping",
        "rating",
        "features",
        "pictures",
        "photos",
        "attributes",
        "categories",
        "videos",
        "volumetries",
        "warranties",
        "variations",
    ];

    Value::Object(
        fields
            .into_iter()
            .map(|field| (field.to_string(), passthrough.clone()))
            .collect(),
    )
}

fn flag_mappings() -> Value {
    let keyword = json!({ "type": "keyword" });
    let boolean = json!({ "type": "boolean" });

    json!({
        "is_store_only": boolean,
        "is_store_pickup": boolean,
        "is_backorder": boolean,
        "is_big_ticket": boolean,
        "super_express": boolean,
        "digital": boolean,
        "fulfillment": boolean,
        "has_free_shipping": boolean,
        "store_only": boolean,
        "store_pickup": boolean,
        "presale_date": keyword,
        "fulfillment_id": keyword,
        "extended_catalogue_days": { "type": "integer" },
        "price": { "type": "double" },
        "percent_off": { "type": "double" }
    })
}

fn ranking_mappings() -> Value {
    let keyword = json!({ "type": "keyword" });

    json!({
        "hierarchical_category": {
            "properties": {
                "lvl0": keyword,
                "lvl1": keyword,
                "lvl2": keyword
            }
        },
        "review_rating": { "type": "double" },
        "total_reviews": { "type": "integer" },
        "store_rating": { "type": "double" },
        "fecha_alta_cms": { "type": "long" },
        "temporada": { "type": "integer" }
    })
}
