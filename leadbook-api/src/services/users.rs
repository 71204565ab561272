use super::{get_payload, put_payload, record_path};
use crate::error::ApiResult;
use crate::gateway::{Body, Gateway, RequestConfig};
use leadbook_types::{RecordId, User, UserPatch};
use reqwest::Method;
use std::sync::Arc;

/// `users/*` endpoints (administration).
#[derive(Debug, Clone)]
pub struct UsersApi {
    gateway: Arc<Gateway>,
}

impl UsersApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> ApiResult<Vec<User>> {
        get_payload(&self.gateway, "users", RequestConfig::default()).await
    }

    pub async fn get(&self, id: &RecordId) -> ApiResult<User> {
        get_payload(&self.gateway, &record_path("users", id, None), RequestConfig::default()).await
    }

    pub async fn update(&self, id: &RecordId, data: &UserPatch) -> ApiResult<User> {
        put_payload(&self.gateway, &record_path("users", id, None), data).await
    }

    pub async fn delete(&self, id: &RecordId) -> ApiResult<()> {
        self.gateway
            .send(Method::DELETE, &record_path("users", id, None), Body::Empty)
            .await
    }
}
