use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

// Timestamps are stored as RFC 3339 strings whose precision varies, so
// string comparison is only trusted once both sides fail to parse as dates.

fn as_timestamp(value: &Value) -> Option<DateTime<FixedOffset>> {
    value
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
}

/// Ordering between two values of a comparable kind, `None` otherwise
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => match (as_timestamp(left), as_timestamp(right)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.cmp(b)),
        },
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

pub fn equals(left: &Value, right: &Value) -> bool {
    compare(left, right) == Some(Ordering::Equal) || left == right
}

/// Equality used by joins: a missing field behaves like null
pub fn join_key_equals(left: Option<&Value>, right: Option<&Value>) -> bool {
    let left = left.unwrap_or(&Value::Null);
    let right = right.unwrap_or(&Value::Null);
    equals(left, right)
}
