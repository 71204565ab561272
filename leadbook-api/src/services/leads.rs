use super::{CommentBody, get_payload, patch_payload, post_payload, put_payload, record_path};
use crate::error::ApiResult;
use crate::gateway::{Body, Gateway, RequestConfig, Upload};
use leadbook_types::{
    Client, Comment, FileAttachment, ImportSummary, Lead, LeadFilters, LeadForm, LeadPatch,
    LeadPriority, LeadStats, LeadStatus, Page, Payload, RecordId,
};
use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;

/// Paging and filters for `GET leads`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeadQuery {
    #[serde(flatten)]
    pub filters: LeadFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl From<LeadFilters> for LeadQuery {
    fn from(filters: LeadFilters) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct StatusBody {
    status: LeadStatus,
}

#[derive(Serialize)]
struct PriorityBody {
    priority: LeadPriority,
}

/// `leads/*` endpoints.
#[derive(Debug, Clone)]
pub struct LeadsApi {
    gateway: Arc<Gateway>,
}

impl LeadsApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, query: &LeadQuery) -> ApiResult<Page<Lead>> {
        self.gateway
            .get("leads", RequestConfig::new().with_params(query))
            .await
    }

    pub async fn get(&self, id: &RecordId) -> ApiResult<Lead> {
        get_payload(&self.gateway, &record_path("leads", id, None), RequestConfig::default()).await
    }

    pub async fn create(&self, data: &LeadForm) -> ApiResult<Lead> {
        post_payload(&self.gateway, "leads", data).await
    }

    pub async fn update(&self, id: &RecordId, data: &LeadPatch) -> ApiResult<Lead> {
        put_payload(&self.gateway, &record_path("leads", id, None), data).await
    }

    pub async fn delete(&self, id: &RecordId) -> ApiResult<()> {
        self.gateway
            .send(Method::DELETE, &record_path("leads", id, None), Body::Empty)
            .await
    }

    /// Turns the lead into a client and returns the new client.
    pub async fn convert(&self, id: &RecordId) -> ApiResult<Client> {
        self.gateway
            .request::<Payload<Client>>(
                Method::POST,
                &record_path("leads", id, Some("convert")),
                Body::Empty,
                RequestConfig::default(),
            )
            .await
            .map(Payload::into_inner)
    }

    pub async fn update_status(&self, id: &RecordId, status: LeadStatus) -> ApiResult<Lead> {
        patch_payload(
            &self.gateway,
            &record_path("leads", id, Some("status")),
            &StatusBody { status },
        )
        .await
    }

    pub async fn update_priority(&self, id: &RecordId, priority: LeadPriority) -> ApiResult<Lead> {
        patch_payload(
            &self.gateway,
            &record_path("leads", id, Some("priority")),
            &PriorityBody { priority },
        )
        .await
    }

    pub async fn add_comment(&self, id: &RecordId, content: &str) -> ApiResult<Comment> {
        post_payload(
            &self.gateway,
            &record_path("leads", id, Some("comments")),
            &CommentBody { content },
        )
        .await
    }

    pub async fn upload_file(&self, id: &RecordId, file: Upload) -> ApiResult<FileAttachment> {
        self.gateway
            .upload::<Payload<FileAttachment>>(&record_path("leads", id, Some("files")), file)
            .await
            .map(Payload::into_inner)
    }

    pub async fn stats(&self) -> ApiResult<LeadStats> {
        get_payload(&self.gateway, "leads/stats", RequestConfig::default()).await
    }

    /// Free-text search over leads.
    ///
    /// Accepts `{ data: [...] }` (paginated or not) as well as a bare list.
    pub async fn search(&self, term: &str) -> ApiResult<Vec<Lead>> {
        get_payload(
            &self.gateway,
            "leads/search",
            RequestConfig::new().param("q", term),
        )
        .await
    }

    /// Raw export file (CSV) for the leads matching `filters`.
    pub async fn export(&self, filters: &LeadFilters) -> ApiResult<Vec<u8>> {
        self.gateway
            .download("leads/export", RequestConfig::new().with_params(filters))
            .await
    }

    pub async fn import(&self, file: Upload) -> ApiResult<ImportSummary> {
        self.gateway
            .upload::<Payload<ImportSummary>>("leads/import", file)
            .await
            .map(Payload::into_inner)
    }
}

