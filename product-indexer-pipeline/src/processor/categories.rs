//! Category flattening.
//!
//! Upstream sends `categories` either as a list of `{name, level, id}`
//! entries or as a list of such lists, in which case only the first list is
//! used. Level 2 is the top of the tree and level 0 the leaf.

use serde_json::Value;

use super::coerce;
use product_indexer_shared::HierarchicalCategory;

/// The two shapes `categories` arrives in.
#[derive(Debug, Clone, PartialEq)]
pub enum Categories {
    Flat(Vec<Value>),
    Nested(Vec<Vec<Value>>),
}

impl Categories {
    /// Classify by the shape of the first element. Returns `None` for
    /// anything that is not a non-empty array.
    pub fn parse(value: Option<&Value>) -> Option<Self> {
        let items = value?.as_array().filter(|items| !items.is_empty())?;

        if items[0].is_array() {
            let nested = items.iter().map(|item| coerce::array(Some(item))).collect();
            Some(Self::Nested(nested))
        } else {
            Some(Self::Flat(items.clone()))
        }
    }

    /// The category entries that describe this product.
    pub fn entries(&self) -> &[Value] {
        match self {
            Self::Flat(entries) => entries,
            Self::Nested(lists) => lists.first().map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CategoryEntry {
    name: String,
    level: i64,
    id: Option<String>,
}

impl CategoryEntry {
    fn parse(value: &Value) -> Option<Self> {
        let name = coerce::string(value.get("name"))?;
        let level = coerce::opt_i64(value.get("level"))?;
        Some(Self {
            name,
            level,
            id: coerce::string(value.get("id")),
        })
    }
}

/// The flattened view of a product's categories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPath {
    pub hierarchy: HierarchicalCategory,
    /// Id of the deepest category present.
    pub leaf_id: Option<String>,
    /// Name of the deepest category present, in its original case.
    pub leaf_name: Option<String>,
    /// The raw entries, for the document's `categories` field.
    pub entries: Vec<Value>,
}

/// Flatten the raw `categories` field into a three-level hierarchy.
///
/// Empty or malformed input yields an empty path.
pub fn flatten(value: Option<&Value>) -> CategoryPath {
    let Some(categories) = Categories::parse(value) else {
        return CategoryPath::default();
    };

    let mut parsed: Vec<CategoryEntry> = categories
        .entries()
        .iter()
        .filter_map(CategoryEntry::parse)
        .collect();
    parsed.sort_by(|a, b| b.level.cmp(&a.level));

    let at_level = |level: i64| parsed.iter().find(|entry| entry.level == level);
    let chosen: Vec<&CategoryEntry> = [2, 1, 0].into_iter().filter_map(at_level).collect();

    let components: Vec<String> = chosen.iter().map(|entry| entry.name.to_lowercase()).collect();
    let deepest = chosen.last();

    CategoryPath {
        hierarchy: HierarchicalCategory::from_components(&components),
        leaf_id: deepest.and_then(|entry| entry.id.clone()),
        leaf_name: deepest.map(|entry| entry.name.clone()),
        entries: categories.entries().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_categories_use_first_list() {
        let raw = json!([
            [{ "name": "A", "level": 2 }, { "name": "B", "level": 1 }, { "name": "C", "level": 0, "id": "c-9" }],
            [{ "name": "Other", "level": 2 }]
        ]);

        let path = flatten(Some(&raw));
        assert_eq!(path.hierarchy.lvl0.as_deref(), Some("a"));
        assert_eq!(path.hierarchy.lvl1.as_deref(), Some("a > b"));
        assert_eq!(path.hierarchy.lvl2.as_deref(), Some("a > b > c"));
        assert_eq!(path.hierarchy.path(), "a > b > c");
        assert_eq!(path.leaf_id.as_deref(), Some("c-9"));
        assert_eq!(path.leaf_name.as_deref(), Some("C"));
        assert_eq!(path.entries.len(), 3);
    }

    #[test]
    fn test_flat_categories_in_any_order() {
        let raw = json!([
            { "name": "Leaf", "level": 0 },
            { "name": "Top", "level": 2 },
            { "name": "Mid", "level": 1 }
        ]);

        let path = flatten(Some(&raw));
        assert_eq!(path.hierarchy.lvl2.as_deref(), Some("top > mid > leaf"));
    }

    #[test]
    fn test_missing_levels_repeat_deepest() {
        let raw = json!([{ "name": "Top", "level": 2 }, { "name": "Mid", "level": 1 }]);

        let path = flatten(Some(&raw));
        assert_eq!(path.hierarchy.lvl0.as_deref(), Some("top"));
        assert_eq!(path.hierarchy.lvl1.as_deref(), Some("top > mid"));
        assert_eq!(path.hierarchy.lvl2.as_deref(), Some("top > mid"));
        assert_eq!(path.leaf_name.as_deref(), Some("Mid"));
    }

    #[test]
    fn test_malformed_input_is_empty() {
        for raw in [json!(null), json!([]), json!("shoes"), json!([{ "level": 1 }]), json!([[]])] {
            let path = flatten(Some(&raw));
            assert!(path.hierarchy.is_empty(), "{raw}");
            assert_eq!(path.hierarchy.path(), "");
        }
        assert!(flatten(None).hierarchy.is_empty());
    }

    #[test]
    fn test_hierarchy_prefix_property() {
        let inputs = [
            json!([{ "name": "A", "level": 2 }]),
            json!([{ "name": "B", "level": 1 }, { "name": "C", "level": 0 }]),
            json!([[{ "name": "X", "level": 2 }, { "name": "Z", "level": 0 }]]),
            json!([{ "name": "A", "level": 2 }, { "name": "B", "level": 1 }, { "name": "C", "level": 0 }]),
        ];

        for raw in inputs {
            let h = flatten(Some(&raw)).hierarchy;
            let (lvl0, lvl1, lvl2) = (h.lvl0.unwrap(), h.lvl1.unwrap(), h.lvl2.unwrap());
            assert!(lvl1 == lvl0 || lvl1.starts_with(&format!("{} > ", lvl0)));
            assert!(lvl2 == lvl1 || lvl2.starts_with(&format!("{} > ", lvl1)));
        }
    }
}
