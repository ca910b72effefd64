//! Per-document import failures and their histogram.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use product_indexer_shared::ProductDocument;

/// Examples retained per error message by default.
pub const DEFAULT_MAX_EXAMPLES: usize = 3;

/// A document the search index did not accept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentFailure {
    pub product_id: i64,
    pub title: String,
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub error_message: String,
    pub error_code: Option<u16>,
    /// The fields most useful for diagnosing a rejection.
    pub raw_document_excerpt: Value,
}

impl DocumentFailure {
    pub fn new(document: &ProductDocument, error_message: impl Into<String>, error_code: Option<u16>) -> Self {
        Self {
            product_id: document.product_id,
            title: document.title.clone(),
            object_id: document.object_id.clone(),
            error_message: error_message.into(),
            error_code,
            raw_document_excerpt: excerpt(document),
        }
    }
}

fn excerpt(document: &ProductDocument) -> Value {
    json!({
        "objectID": document.object_id,
        "product_id": document.product_id,
        "title": document.title,
        "title_seo": document.title_seo,
        "stock": document.stock,
        "is_active": document.is_active,
        "sale_price": document.sale_price,
        "relevance_score": document.relevance_score,
        "hierarchical_category": document.hierarchical_category,
    })
}

/// One histogram bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBucket {
    pub count: usize,
    pub examples: Vec<DocumentFailure>,
}

/// Failures grouped by error message, with a few examples each.
///
/// Serializes as a plain map `{message: {count, examples}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ErrorAnalysis {
    buckets: BTreeMap<String, ErrorBucket>,
    #[serde(skip)]
    max_examples: usize,
}

impl Default for ErrorAnalysis {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXAMPLES)
    }
}

impl ErrorAnalysis {
    pub fn new(max_examples: usize) -> Self {
        Self {
            buckets: BTreeMap::new(),
            max_examples,
        }
    }

    pub fn record(&mut self, failure: &DocumentFailure) {
        let bucket = self
            .buckets
            .entry(failure.error_message.clone())
            .or_insert_with(|| ErrorBucket {
                count: 0,
                examples: Vec::new(),
            });
        bucket.count += 1;
        if bucket.examples.len() < self.max_examples {
            bucket.examples.push(failure.clone());
        }
    }

    /// Fold another histogram into this one, keeping the example cap.
    pub fn merge(&mut self, other: &ErrorAnalysis) {
        for (message, incoming) in &other.buckets {
            let bucket = self
                .buckets
                .entry(message.clone())
                .or_insert_with(|| ErrorBucket {
                    count: 0,
                    examples: Vec::new(),
                });
            bucket.count += incoming.count;
            let room = self.max_examples.saturating_sub(bucket.examples.len());
            bucket
                .examples
                .extend(incoming.examples.iter().take(room).cloned());
        }
    }

    pub fn get(&self, message: &str) -> Option<&ErrorBucket> {
        self.buckets.get(message)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of distinct messages.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(|b| b.count).sum()
    }

    /// Buckets ordered by descending count.
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .buckets
            .iter()
            .map(|(message, bucket)| (message.as_str(), bucket.count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        counts
    }
}
