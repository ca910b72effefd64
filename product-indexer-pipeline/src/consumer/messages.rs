//! Response envelope of the upstream catalog API.

use serde_json::Value;

/// One page of raw records as returned by the catalog API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    /// Raw product records, untouched.
    pub records: Vec<Value>,
    /// Total number of pages, when the API reports pagination.
    pub page_count: Option<u32>,
}

impl CatalogPage {
    pub fn new(records: Vec<Value>, page_count: Option<u32>) -> Self {
        Self {
            records,
            page_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the API says there are pages after `page`.
    ///
    /// A page without pagination metadata is treated as the last one.
    pub fn has_more_after(&self, page: u32) -> bool {
        self.page_count.is_some_and(|count| page < count)
    }
}

/// Parse a response body of the form
/// `{metadata: {is_error, message?}, data: [...], pagination: {pageCount}}`.
///
/// # Returns
///
/// * `Ok(CatalogPage)` - When `metadata.is_error` is exactly `false`
/// * `Err(String)` - The API's message, or a description of the malformed envelope
pub fn parse_envelope(body: &Value) -> Result<CatalogPage, String> {
    let metadata = body
        .get("metadata")
        .ok_or_else(|| "response has no metadata".to_string())?;

    match metadata.get("is_error") {
        Some(Value::Bool(false)) => {}
        Some(Value::Bool(true)) => {
            let message = metadata
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(format!("catalog API reported an error: {}", message));
        }
        _ => return Err("response metadata has no is_error flag".to_string()),
    }

    let records = match body.get("data") {
        Some(Value::Array(records)) => records.clone(),
        _ => Vec::new(),
    };

    let page_count = body
        .get("pagination")
        .and_then(|p| p.get("pageCount"))
        .and_then(|count| match count {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .and_then(|count| u32::try_from(count).ok());

    Ok(CatalogPage {
        records,
        page_count,
    })
}
