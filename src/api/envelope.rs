//! Response envelope unwrapping
//!
//! The e-signature API wraps payloads inconsistently: a record may come back
//! bare, under `data`, or under `data.data`. Every caller that reads a response
//! goes through these helpers with an explicit list of paths to try in order.

use serde_json::{Map, Value};

/// A sequence of object keys walked from the response root
pub type Path = &'static [&'static str];

/// Where a record may sit in a response, deepest first
pub const RECORD_PATHS: &[Path] = &[&["data", "data"], &["data"], &[]];

/// Where a list of records may sit in a response, deepest first
pub const LIST_PATHS: &[Path] = &[&["data", "data"], &["data", "docs"], &["data"], &[]];

/// Where the id of a freshly created workflow response may sit
pub const RESPONSE_ID_PATHS: &[Path] = &[&["data", "data", "_id"], &["data", "_id"], &["_id"], &["id"]];

/// Walk `path` from `raw`.
pub fn lookup<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(raw, |current, key| current.get(*key))
}

/// The first path that resolves to an object.
pub fn first_object<'a>(raw: &'a Value, paths: &[Path]) -> Option<&'a Map<String, Value>> {
    paths
        .iter()
        .find_map(|path| lookup(raw, path).and_then(Value::as_object))
}

/// The first path that resolves to an array.
pub fn first_array<'a>(raw: &'a Value, paths: &[Path]) -> Option<&'a Vec<Value>> {
    paths
        .iter()
        .find_map(|path| lookup(raw, path).and_then(Value::as_array))
}

/// The first path that resolves to a non-null, non-empty value.
pub fn first_present<'a>(raw: &'a Value, paths: &[Path]) -> Option<&'a Value> {
    paths.iter().find_map(|path| {
        lookup(raw, path).filter(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
    })
}

/// The first path holding a non-blank string or a number, rendered as an id.
pub fn first_id(raw: &Value, paths: &[Path]) -> Option<String> {
    paths.iter().find_map(|path| match first_present(raw, &[*path])? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
