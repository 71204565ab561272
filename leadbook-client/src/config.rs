//! Context configuration.

use leadbook_api::GatewayConfig;
use leadbook_query::QueryClientConfig;

/// Everything a [`CrmContext`](crate::CrmContext) needs besides its
/// storage and notifier.
#[derive(Debug, Clone, Default)]
pub struct CrmConfig {
    pub gateway: GatewayConfig,
    pub query: QueryClientConfig,
}

impl CrmConfig {
    /// Gateway settings from `LEADBOOK_API_URL` and
    /// `LEADBOOK_API_TIMEOUT_SECS`, cache defaults otherwise.
    pub fn from_env() -> Self {
        Self {
            gateway: GatewayConfig::from_env(),
            query: QueryClientConfig::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.gateway = self.gateway.with_base_url(base_url);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: QueryClientConfig) -> Self {
        self.query = query;
        self
    }
}
