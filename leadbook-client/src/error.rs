//! Composition errors.

use leadbook_api::ApiError;
use leadbook_session::StorageError;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while assembling a [`CrmContext`](crate::CrmContext).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("gateway error: {0}")]
    Api(#[from] ApiError),

    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
}
