//! Decoding of collection values received from the remote store.
//!
//! The store keeps arrays as objects keyed by index and hands them back
//! either as arrays (with `null` holes when indices are sparse) or as
//! objects-of-objects. This module is the only place that knows about those
//! shapes; everything past it sees a plain sequence.

use crate::{error::Result, Error};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Normalize a remote collection value into its elements.
///
/// - `null` (absent collection): empty
/// - array: elements in order, `null` holes dropped
/// - object: values ordered by key, numeric keys numerically
pub fn decode_collection(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.into_iter().filter(|v| !v.is_null()).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                (Err(_), Err(_)) => a.cmp(b),
            });
            Ok(entries
                .into_iter()
                .map(|(_, v)| v)
                .filter(|v| !v.is_null())
                .collect())
        }
        other => Err(Error::MalformedPayload(format!(
            "expected array or object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Decode a remote collection into typed records.
///
/// All-or-nothing: one undecodable element fails the whole collection, so a
/// caller never replaces local data with a partial view of the remote one.
pub fn decode_records<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    decode_collection(value)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| Error::MalformedPayload(format!("element {i}: {e}")))
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_empty() {
        assert!(decode_collection(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn sparse_array_drops_holes() {
        let items = decode_collection(json!([{"id": "a"}, null, {"id": "b"}])).unwrap();
        assert_eq!(items, vec![json!({"id": "a"}), json!({"id": "b"})]);
    }

    #[test]
    fn object_of_objects_is_ordered_by_index() {
        let items = decode_collection(json!({
            "10": {"id": "k"},
            "2": {"id": "c"},
            "0": {"id": "a"}
        }))
        .unwrap();
        let ids: Vec<_> = items.iter().map(|v| v["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "c", "k"]);
    }

    #[test]
    fn scalars_are_malformed() {
        let err = decode_collection(json!("oops")).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedPayload("expected array or object, got string".into())
        );
    }

    #[test]
    fn typed_decode_is_all_or_nothing() {
        #[derive(serde::Deserialize, Debug)]
        struct Item {
            #[allow(dead_code)]
            id: String,
        }

        assert_eq!(
            decode_records::<Item>(json!([{"id": "a"}, {"id": "b"}]))
                .unwrap()
                .len(),
            2
        );
        assert!(decode_records::<Item>(json!([{"id": "a"}, {"nope": 1}])).is_err());
    }
}
