//! Canonical JSON rendering of block payloads.
//!
//! The digest of a block covers the textual form of its payload, so two
//! payloads that differ only in object key order must render identically.
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// Convert any serializable payload into a JSON value.
pub fn to_payload<T: Serialize + ?Sized>(data: &T) -> Result<Value> {
    Ok(serde_json::to_value(data)?)
}

/// Rebuild `value` with every object's keys in ascending order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Compact JSON text of the canonical form of `value`.
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}
