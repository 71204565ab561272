use super::{get_payload, post_payload, put_payload};
use crate::error::ApiResult;
use crate::gateway::{Body, Gateway, RequestConfig};
use leadbook_types::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, User, UserProfileForm,
};
use reqwest::Method;
use std::sync::Arc;
use tracing::debug;

/// `auth/*` endpoints.
#[derive(Debug, Clone)]
pub struct AuthApi {
    gateway: Arc<Gateway>,
}

impl AuthApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> ApiResult<AuthResponse> {
        debug!("logging in as {}", credentials.login);
        post_payload(&self.gateway, "auth/login", credentials).await
    }

    pub async fn register(&self, data: &RegisterRequest) -> ApiResult<AuthResponse> {
        debug!("registering {}", data.email);
        post_payload(&self.gateway, "auth/register", data).await
    }

    pub async fn profile(&self) -> ApiResult<User> {
        get_payload(&self.gateway, "auth/profile", RequestConfig::default()).await
    }

    pub async fn update_profile(&self, data: &UserProfileForm) -> ApiResult<User> {
        put_payload(&self.gateway, "auth/profile", data).await
    }

    pub async fn change_password(&self, data: &ChangePasswordRequest) -> ApiResult<()> {
        let body = Body::json(data)?;
        self.gateway
            .send(Method::PUT, "auth/change-password", body)
            .await
    }
}
