//! Query-string helpers.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Flattens a serializable parameter struct into query pairs.
///
/// Null and empty-string values are skipped; arrays repeat their key once per
/// element. Anything that does not serialize to a JSON object yields no pairs.
pub fn query_pairs<T: Serialize + ?Sized>(params: &T) -> Vec<(String, String)> {
    let value = match serde_json::to_value(params) {
        Ok(value) => value,
        Err(e) => {
            debug!("query parameters did not serialize: {e}");
            return Vec::new();
        }
    };
    let Value::Object(map) = value else {
        return Vec::new();
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(s) = scalar(item) {
                        pairs.push((key.clone(), s));
                    }
                }
            }
            other => {
                if let Some(s) = scalar(other) {
                    pairs.push((key, s));
                }
            }
        }
    }
    pairs
}

/// Renders parameters as an encoded query string without the leading `?`.
pub fn build_query_string<T: Serialize + ?Sized>(params: &T) -> String {
    query_pairs(params)
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encodes one path segment (a record id, usually).
pub fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

fn scalar(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}
