//! The composition root.

use crate::config::CrmConfig;
use crate::error::ClientResult;
use crate::resources::{Binding, Clients, Dashboard, Leads, Profile, Teams, Users};
use async_trait::async_trait;
use leadbook_api::{AuthProvider, CrmApi, Gateway};
use leadbook_query::{LogNotifier, Notifier, QueryClient};
use leadbook_session::{FileStorage, SessionResult, SessionStorage, SessionStore};
use leadbook_types::{AuthResponse, LoginRequest, RegisterRequest};
use std::sync::Arc;
use tracing::{debug, info};

/// Wraps the session's provider so a rejected credential also drops every
/// cached query. Runs before the failed request returns to its caller.
struct ExpireCache {
    session: Arc<dyn AuthProvider>,
    queries: QueryClient,
}

#[async_trait]
impl AuthProvider for ExpireCache {
    async fn bearer_token(&self) -> Option<String> {
        self.session.bearer_token().await
    }

    async fn on_unauthorized(&self) {
        self.session.on_unauthorized().await;
        self.queries.clear();
        debug!("query cache cleared after session expiry");
    }
}

/// One signed-in (or signed-out) application instance: gateway, session,
/// query cache and services wired together.
///
/// Everything inside is shared through `Arc`s, so screens hold resource
/// bundles rather than the context itself.
pub struct CrmContext {
    config: CrmConfig,
    gateway: Arc<Gateway>,
    session: Arc<SessionStore>,
    queries: QueryClient,
    api: CrmApi,
    notifier: Arc<dyn Notifier>,
}

impl CrmContext {
    /// Builds the context and restores the persisted session.
    pub fn init(
        config: CrmConfig,
        storage: Arc<dyn SessionStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> ClientResult<Self> {
        let gateway = Arc::new(Gateway::new(config.gateway.clone())?);
        let session = Arc::new(SessionStore::new(Arc::clone(&gateway), storage));
        let queries = QueryClient::with_config(config.query.clone());
        let api = CrmApi::new(Arc::clone(&gateway));
        gateway.set_auth_provider(Arc::new(ExpireCache {
            session: session.auth_provider(),
            queries: queries.clone(),
        }));

        let restored = session.bootstrap();
        info!(
            base_url = %config.gateway.base_url,
            authenticated = restored.is_authenticated,
            "crm context ready"
        );

        Ok(Self {
            config,
            gateway,
            session,
            queries,
            api,
            notifier,
        })
    }

    /// [`init`](Self::init) with the session file in the platform data
    /// directory and notifications sent to the log.
    pub fn open(config: CrmConfig) -> ClientResult<Self> {
        let storage = FileStorage::open_default()?;
        Self::init(config, Arc::new(storage), Arc::new(LogNotifier))
    }

    pub fn config(&self) -> &CrmConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub fn api(&self) -> &CrmApi {
        &self.api
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Signs in. Data cached for a previous account is dropped.
    pub async fn login(&self, credentials: &LoginRequest) -> SessionResult<AuthResponse> {
        let auth = self.session.login(credentials).await?;
        self.queries.clear();
        Ok(auth)
    }

    pub async fn register(&self, data: &RegisterRequest) -> SessionResult<AuthResponse> {
        let auth = self.session.register(data).await?;
        self.queries.clear();
        Ok(auth)
    }

    /// Signs out and drops every cached query.
    pub fn logout(&self) {
        self.session.logout();
        self.queries.clear();
    }

    /// Signs out, empties the cache and detaches the session from the
    /// gateway.
    pub fn shutdown(self) {
        self.logout();
        self.gateway.clear_auth_provider();
        info!("crm context shut down");
    }

    fn binding(&self) -> Binding {
        Binding::new(self.queries.clone(), Arc::clone(&self.notifier))
    }

    pub fn leads(&self) -> Leads {
        Leads::new(self.api.leads.clone(), self.binding())
    }

    pub fn clients(&self) -> Clients {
        Clients::new(self.api.clients.clone(), self.binding())
    }

    pub fn teams(&self) -> Teams {
        Teams::new(
            self.api.teams.clone(),
            Arc::clone(&self.session),
            self.binding(),
        )
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.api.dashboard.clone(), self.binding())
    }

    pub fn profile(&self) -> Profile {
        Profile::new(
            self.api.auth.clone(),
            Arc::clone(&self.session),
            self.binding(),
        )
    }

    pub fn users(&self) -> Users {
        Users::new(self.api.users.clone(), self.binding())
    }
}

impl std::fmt::Debug for CrmContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrmContext")
            .field("config", &self.config)
            .field("session", &self.session.snapshot().status)
            .field("queries", &self.queries)
            .finish_non_exhaustive()
    }
}
