use super::Binding;
use crate::keys;
use leadbook_api::DashboardApi;
use leadbook_query::QueryObserver;
use leadbook_types::DashboardSummary;

/// The dashboard summary.
#[derive(Debug, Clone)]
pub struct Dashboard {
    api: DashboardApi,
    binding: Binding,
}

impl Dashboard {
    pub(crate) fn new(api: DashboardApi, binding: Binding) -> Self {
        Self { api, binding }
    }

    pub fn stats(&self) -> QueryObserver<DashboardSummary> {
        let api = self.api.clone();
        self.binding.observe(
            keys::dashboard_stats(),
            move || {
                let api = api.clone();
                async move { api.stats().await }
            },
            self.binding.options(),
        )
    }

    /// Loads the summary ahead of the dashboard screen.
    pub async fn prefetch(&self) {
        let api = self.api.clone();
        self.binding
            .queries()
            .prefetch_query(keys::dashboard_stats(), move || {
                let api = api.clone();
                async move { api.stats().await }
            })
            .await;
    }
}
