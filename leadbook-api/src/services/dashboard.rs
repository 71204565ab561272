use super::get_payload;
use crate::error::ApiResult;
use crate::gateway::{Gateway, RequestConfig};
use leadbook_types::DashboardSummary;
use std::sync::Arc;

/// `dashboard/*` endpoints.
#[derive(Debug, Clone)]
pub struct DashboardApi {
    gateway: Arc<Gateway>,
}

impl DashboardApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Headline numbers plus the most recent leads and clients.
    pub async fn stats(&self) -> ApiResult<DashboardSummary> {
        get_payload(&self.gateway, "dashboard/stats", RequestConfig::default()).await
    }
}
