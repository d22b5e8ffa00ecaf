use std::collections::HashMap;

use super::errors::StoreError;

// ============================================================================
// Collection Schema - Unique and text indexes known to a backend
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TextIndex {
    pub name: String,
    /// Indexed fields with their relevance weights
    pub fields: Vec<(String, u32)>,
    pub default_language: String,
}

impl TextIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            default_language: "english".to_string(),
        }
    }

    pub fn field(mut self, field: impl Into<String>, weight: u32) -> Self {
        self.fields.push((field.into(), weight.max(1)));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSpec {
    pub name: String,
    pub unique: Vec<String>,
    pub text_index: Option<TextIndex>,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique: Vec::new(),
            text_index: None,
        }
    }

    pub fn unique(mut self, field: impl Into<String>) -> Self {
        self.unique.push(field.into());
        self
    }

    pub fn text(mut self, index: TextIndex) -> Self {
        self.text_index = Some(index);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    collections: HashMap<String, CollectionSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, spec: CollectionSpec) -> Self {
        self.collections.insert(spec.name.clone(), spec);
        self
    }

    pub fn get(&self, name: &str) -> Result<&CollectionSpec, StoreError> {
        self.collections
            .get(name)
            .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }
}
