//! Response envelopes.
//!
//! Most endpoints wrap their payload as `{ success, data, message }`, a few
//! answer with the bare document. [`Payload`] accepts both.

use serde::{Deserialize, Serialize};

/// A response body that is either `{ "data": T, ... }` or `T` itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    pub fn into_inner(self) -> T {
        match self {
            Payload::Wrapped { data } | Payload::Bare(data) => data,
        }
    }
}

/// Error body sent with non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub errors: Vec<FieldError>,
}

/// A validation error bound to one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
