//! Classify a page from its structured-data types.

use crate::acquisition::structured_data::{local_type_name, StructuredDataBundle};
use std::collections::HashMap;

/// Structured-data type name → canonical page type.
#[derive(Debug, Clone, Default)]
pub struct MarkupTypeMap {
    types: HashMap<String, String>,
}

impl MarkupTypeMap {
    pub fn new(types: HashMap<String, String>) -> Self {
        Self { types }
    }

    pub fn get(&self, type_name: &str) -> Option<&str> {
        self.types
            .get(type_name)
            .or_else(|| self.types.get(local_type_name(type_name)))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Label for the first type in bundle-then-item order that the map knows,
/// or `None` when no type is mapped.
pub fn classify_markup<'a>(bundle: &StructuredDataBundle, map: &'a MarkupTypeMap) -> Option<&'a str> {
    bundle.type_names().into_iter().find_map(|t| map.get(t))
}
