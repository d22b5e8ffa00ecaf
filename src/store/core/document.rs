use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::StoreError;

// ============================================================================
// Documents - The unit of storage
// ============================================================================
//
// A document is a JSON object. Identity lives under `_id` in storage while
// domain types expose it as `id`; `encode`/`decode` translate between the
// two so domain structs carry a single serde shape.
//
// ============================================================================

pub type Document = serde_json::Map<String, Value>;

pub const ID_FIELD: &str = "_id";
const DOMAIN_ID_FIELD: &str = "id";

/// Generate a fresh, time-ordered document identity
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

pub fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

/// Serialize a domain value into a storage document (`id` becomes `_id`)
pub fn encode<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(mut document) => {
            if let Some(id) = document.remove(DOMAIN_ID_FIELD) {
                document.insert(ID_FIELD.to_string(), id);
            }
            Ok(document)
        }
        _ => Err(StoreError::NotADocument),
    }
}

/// Deserialize a storage document into a domain value.
///
/// `_id` is renamed at every nesting level, so documents produced by
/// lookup stages decode with their embedded records intact.
pub fn decode<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    let mut value = Value::Object(document);
    rename_ids(&mut value);
    Ok(serde_json::from_value(value)?)
}

fn rename_ids(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(id) = map.remove(ID_FIELD) {
                map.insert(DOMAIN_ID_FIELD.to_string(), id);
            }
            map.values_mut().for_each(rename_ids);
        }
        Value::Array(items) => items.iter_mut().for_each(rename_ids),
        _ => {}
    }
}
