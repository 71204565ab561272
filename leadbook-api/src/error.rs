//! Gateway error types.

use leadbook_types::FieldError;
use thiserror::Error;

/// Result type for gateway operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the gateway and the resource services.
///
/// Cloneable so a single failed fetch can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// 401: credential rejected or expired. The session has already been
    /// torn down by the time the caller sees this.
    #[error("session expired or credentials rejected")]
    Unauthorized { message: Option<String> },

    /// 403: authenticated but not permitted.
    #[error("access denied")]
    Forbidden { message: Option<String> },

    /// 5xx.
    #[error("server error ({status})")]
    Server { status: u16, message: Option<String> },

    /// Any other non-2xx status, usually a validation or business rule.
    #[error("request rejected ({status}): {}", message.as_deref().unwrap_or("no details"))]
    Rejected {
        status: u16,
        message: Option<String>,
        errors: Vec<FieldError>,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of the failed response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::Server { status, .. } | ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `message` field of the server's error body, if it sent one.
    pub fn payload_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::Server { message, .. }
            | ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Per-field validation errors, empty unless the server rejected a form.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ApiError::Rejected { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Returns true if no response was received at all.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Transport failures and server faults may succeed on a second attempt;
    /// 4xx answers will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Timeout | ApiError::Server { .. }
        )
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_builder() {
            ApiError::Config(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
