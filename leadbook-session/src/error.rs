//! Session error types.

use leadbook_api::ApiError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of a [`SessionStorage`](crate::SessionStorage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not a JSON string map.
    #[error("corrupt session file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("no platform data directory available")]
    NoDataDir,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend rejected the request or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to encode session user: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    /// The gateway error, if the failure came from the backend.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
