//! Query keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Identifies one cached query: a resource name followed by the ids or
/// filters that select it, e.g. `["leads", {"status": "new"}]`.
///
/// Keys compare by deep value, and a key matches every key it is a prefix
/// of, so invalidating `["leads"]` reaches `["leads", "l1"]` too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<Value>);

impl QueryKey {
    /// A single-segment key.
    pub fn new(resource: impl Into<String>) -> Self {
        Self(vec![Value::String(resource.into())])
    }

    pub fn from_parts(parts: Vec<Value>) -> Self {
        Self(parts)
    }

    /// Appends one segment. Values that do not serialize become `null`.
    #[must_use]
    pub fn with<T: Serialize + ?Sized>(mut self, part: &T) -> Self {
        self.0.push(to_part(part));
        self
    }

    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `prefix` equals the leading segments of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        prefix.0.len() <= self.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }
}

/// Converts one key segment.
#[doc(hidden)]
pub fn to_part<T: Serialize + ?Sized>(part: &T) -> Value {
    serde_json::to_value(part).unwrap_or_else(|e| {
        debug!("query key segment did not serialize: {e}");
        Value::Null
    })
}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for part in &self.0 {
            hash_value(part, state);
        }
    }
}

/// Hashes consistently with `Value`'s `Eq`: object keys in sorted order.
fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => 0u8.hash(state),
        Value::Bool(b) => {
            1u8.hash(state);
            b.hash(state);
        }
        Value::Number(n) => {
            2u8.hash(state);
            n.to_string().hash(state);
        }
        Value::String(s) => {
            3u8.hash(state);
            s.hash(state);
        }
        Value::Array(items) => {
            4u8.hash(state);
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        Value::Object(map) => {
            5u8.hash(state);
            map.len().hash(state);
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (k, v) in entries {
                k.hash(state);
                hash_value(v, state);
            }
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

impl From<&str> for QueryKey {
    fn from(resource: &str) -> Self {
        Self::new(resource)
    }
}

impl From<Vec<Value>> for QueryKey {
    fn from(parts: Vec<Value>) -> Self {
        Self(parts)
    }
}

/// Builds a [`QueryKey`] from serializable segments.
///
/// ```
/// use leadbook_query::query_key;
/// let key = query_key!["leads", "search", "acme"];
/// assert_eq!(key.to_string(), r#"["leads","search","acme"]"#);
/// ```
#[macro_export]
macro_rules! query_key {
    ($($part:expr),* $(,)?) => {
        $crate::QueryKey::from_parts(vec![$($crate::key::to_part(&$part)),*])
    };
}
