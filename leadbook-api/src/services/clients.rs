use super::{CommentBody, get_payload, post_payload, put_payload, record_path};
use crate::error::ApiResult;
use crate::gateway::{Body, Gateway, RequestConfig, Upload};
use leadbook_types::{
    Client, ClientFilters, ClientForm, ClientPatch, ClientStats, Comment, FileAttachment, Page,
    Payload, RecordId,
};
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;

/// Paging and filters for `GET clients`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientQuery {
    #[serde(flatten)]
    pub filters: ClientFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl From<ClientFilters> for ClientQuery {
    fn from(filters: ClientFilters) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }
}

/// `clients/*` endpoints.
#[derive(Debug, Clone)]
pub struct ClientsApi {
    gateway: Arc<Gateway>,
}

impl ClientsApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, query: &ClientQuery) -> ApiResult<Page<Client>> {
        self.gateway
            .get("clients", RequestConfig::new().with_params(query))
            .await
    }

    pub async fn get(&self, id: &RecordId) -> ApiResult<Client> {
        get_payload(
            &self.gateway,
            &record_path("clients", id, None),
            RequestConfig::default(),
        )
        .await
    }

    pub async fn create(&self, data: &ClientForm) -> ApiResult<Client> {
        post_payload(&self.gateway, "clients", data).await
    }

    pub async fn update(&self, id: &RecordId, data: &ClientPatch) -> ApiResult<Client> {
        put_payload(&self.gateway, &record_path("clients", id, None), data).await
    }

    pub async fn delete(&self, id: &RecordId) -> ApiResult<()> {
        self.gateway
            .send(Method::DELETE, &record_path("clients", id, None), Body::Empty)
            .await
    }

    pub async fn add_comment(&self, id: &RecordId, content: &str) -> ApiResult<Comment> {
        post_payload(
            &self.gateway,
            &record_path("clients", id, Some("comments")),
            &CommentBody { content },
        )
        .await
    }

    pub async fn upload_file(&self, id: &RecordId, file: Upload) -> ApiResult<FileAttachment> {
        self.gateway
            .upload::<Payload<FileAttachment>>(&record_path("clients", id, Some("files")), file)
            .await
            .map(Payload::into_inner)
    }

    pub async fn stats(&self) -> ApiResult<ClientStats> {
        get_payload(&self.gateway, "clients/stats", RequestConfig::default()).await
    }
}
