use serde_json::{json, Value};

use super::document::ID_FIELD;

// ============================================================================
// Filters - Declarative document predicates
// ============================================================================
//
// Backends evaluate filters directly; `to_native` renders the MongoDB query
// dialect, which is what gets logged and what a driver adapter would send.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    Eq { field: String, value: Value },
    Gt { field: String, value: Value },
    Lt { field: String, value: Value },
    /// Full-text predicate over the collection's text index
    Text { search: String },
}

impl Filter {
    pub fn all() -> Self {
        Filter::All
    }

    pub fn id(id: impl Into<String>) -> Self {
        Filter::Eq {
            field: ID_FIELD.to_string(),
            value: Value::String(id.into()),
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn text(search: impl Into<String>) -> Self {
        Filter::Text {
            search: search.into(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Filter::Text { .. })
    }

    pub fn to_native(&self) -> Value {
        match self {
            Filter::All => json!({}),
            Filter::Eq { field, value } => json!({ field.as_str(): { "$eq": value } }),
            Filter::Gt { field, value } => json!({ field.as_str(): { "$gt": value } }),
            Filter::Lt { field, value } => json!({ field.as_str(): { "$lt": value } }),
            Filter::Text { search } => json!({ "$text": { "$search": search } }),
        }
    }
}
