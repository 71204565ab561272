use super::{get_payload, post_payload, put_payload, record_path};
use crate::error::ApiResult;
use crate::gateway::{Body, Gateway, RequestConfig};
use crate::query::segment;
use leadbook_types::{Payload, RecordId, Team, TeamForm, TeamPatch, User};
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct InviteBody<'a> {
    email: &'a str,
}

/// `teams/*` endpoints.
#[derive(Debug, Clone)]
pub struct TeamsApi {
    gateway: Arc<Gateway>,
}

impl TeamsApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> ApiResult<Vec<Team>> {
        get_payload(&self.gateway, "teams", RequestConfig::default()).await
    }

    pub async fn get(&self, id: &RecordId) -> ApiResult<Team> {
        get_payload(&self.gateway, &record_path("teams", id, None), RequestConfig::default()).await
    }

    pub async fn create(&self, data: &TeamForm) -> ApiResult<Team> {
        post_payload(&self.gateway, "teams", data).await
    }

    pub async fn update(&self, id: &RecordId, data: &TeamPatch) -> ApiResult<Team> {
        put_payload(&self.gateway, &record_path("teams", id, None), data).await
    }

    pub async fn delete(&self, id: &RecordId) -> ApiResult<()> {
        self.gateway
            .send(Method::DELETE, &record_path("teams", id, None), Body::Empty)
            .await
    }

    /// Makes `id` the caller's active team. Returns the updated user.
    pub async fn switch(&self, id: &RecordId) -> ApiResult<User> {
        self.gateway
            .request::<Payload<User>>(
                Method::POST,
                &record_path("teams", id, Some("switch")),
                Body::Empty,
                RequestConfig::default(),
            )
            .await
            .map(Payload::into_inner)
    }

    pub async fn invite(&self, id: &RecordId, email: &str) -> ApiResult<()> {
        let body = Body::json(&InviteBody { email })?;
        self.gateway
            .send(Method::POST, &record_path("teams", id, Some("invite")), body)
            .await
    }

    pub async fn remove_member(&self, team: &RecordId, user: &RecordId) -> ApiResult<()> {
        let path = record_path(
            "teams",
            team,
            Some(&format!("members/{}", segment(user.as_str()))),
        );
        self.gateway.send(Method::DELETE, &path, Body::Empty).await
    }
}
