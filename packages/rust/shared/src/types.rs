//! Concept catalog domain types, as served by the Harvest `concepts/` API.
//!
//! Upstream payloads are sparse: keys are often missing and scalars are often
//! `null`. Every struct therefore decodes missing or `null` values to the
//! type's zero value instead of failing.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A classification label attached to a concept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Enclosing category. Informational only, never traversed by the export.
    pub parent: Option<Arc<Category>>,
    #[serde(deserialize_with = "null_as_default")]
    pub order: f32,
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A single named attribute of exactly one concept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    /// Primary key; the API names it `pk` rather than `id`.
    #[serde(rename = "pk", deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub alt_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub alt_plural_name: String,
}

// ---------------------------------------------------------------------------
// Concept
// ---------------------------------------------------------------------------

/// A top-level catalog entry grouping fields under one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Concept {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub plural_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,

    /// Shared category reference; `None` when the API sent `null` or omitted it.
    pub category: Option<Arc<Category>>,
    /// Owned fields in source order.
    #[serde(deserialize_with = "null_as_default")]
    pub fields: Vec<Field>,

    #[serde(deserialize_with = "null_as_default")]
    pub published: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub queryable: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub sortable: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub viewable: bool,

    #[serde(deserialize_with = "null_as_default")]
    pub order: f32,
}

impl Concept {
    /// Name of the concept's category, if it has one.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref().map(|c| c.name.as_str())
    }
}

/// Decode `null` as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_concept_uses_zero_values() {
        let json = r#"{"id":1,"name":"Patient","category":{"id":1,"name":"Demographics"},
            "fields":[{"pk":7,"name":"Age","description":" years old "}]}"#;
        let concept: Concept = serde_json::from_str(json).expect("deserialize");

        assert_eq!(concept.name, "Patient");
        assert_eq!(concept.plural_name, "");
        assert!(!concept.published);
        assert_eq!(concept.category_name(), Some("Demographics"));
        assert_eq!(concept.fields.len(), 1);
        assert_eq!(concept.fields[0].id, 7);
        assert_eq!(concept.fields[0].description, " years old ");
        assert_eq!(concept.fields[0].alt_name, "");
    }

    #[test]
    fn null_scalars_decode_as_defaults() {
        let json = r#"{"id":2,"name":null,"description":null,"category":null,
            "fields":null,"published":null,"order":null}"#;
        let concept: Concept = serde_json::from_str(json).expect("deserialize");

        assert_eq!(concept.name, "");
        assert!(concept.category.is_none());
        assert!(concept.fields.is_empty());
        assert_eq!(concept.category_name(), None);
    }

    #[test]
    fn nested_parent_category() {
        let json = r#"{"id":3,"name":"Labs","parent":{"id":1,"name":"Clinical","parent":null,"order":1.0},"order":2.5}"#;
        let category: Category = serde_json::from_str(json).expect("deserialize");

        let parent = category.parent.as_deref().expect("parent present");
        assert_eq!(parent.name, "Clinical");
        assert!(parent.parent.is_none());
        assert_eq!(category.order, 2.5);
    }

    #[test]
    fn fixture_validates() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/concepts.fixture.json")
            .expect("read fixture");
        let concepts: Vec<Concept> =
            serde_json::from_str(&fixture).expect("deserialize fixture concepts");

        assert_eq!(concepts.len(), 3);
        assert_eq!(concepts[0].name, "Patient");
        assert_eq!(concepts[0].fields.len(), 3);
        assert!(concepts[0].published);
        assert_eq!(concepts[1].category_name(), Some("Clinical"));
        assert!(concepts[2].fields.is_empty());
    }
}
