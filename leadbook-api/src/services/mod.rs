//! Typed wrappers over the CRM REST endpoints.
//!
//! Each service owns an `Arc<Gateway>` and maps one backend resource. Single
//! documents come back through [`Payload`] so both `{ data: T }` and bare `T`
//! bodies decode; list endpoints decode straight into [`Page`].

mod auth;
mod clients;
mod dashboard;
mod leads;
mod teams;
mod users;

pub use auth::AuthApi;
pub use clients::{ClientQuery, ClientsApi};
pub use dashboard::DashboardApi;
pub use leads::{LeadQuery, LeadsApi};
pub use teams::TeamsApi;
pub use users::UsersApi;

use crate::error::ApiResult;
use crate::gateway::{Gateway, RequestConfig};
use leadbook_types::{Payload, RecordId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// All resource services sharing one gateway.
#[derive(Debug, Clone)]
pub struct CrmApi {
    pub auth: AuthApi,
    pub leads: LeadsApi,
    pub clients: ClientsApi,
    pub teams: TeamsApi,
    pub dashboard: DashboardApi,
    pub users: UsersApi,
}

impl CrmApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            auth: AuthApi::new(Arc::clone(&gateway)),
            leads: LeadsApi::new(Arc::clone(&gateway)),
            clients: ClientsApi::new(Arc::clone(&gateway)),
            teams: TeamsApi::new(Arc::clone(&gateway)),
            dashboard: DashboardApi::new(Arc::clone(&gateway)),
            users: UsersApi::new(gateway),
        }
    }
}

/// `{ content }` body for comment endpoints.
#[derive(Serialize)]
struct CommentBody<'a> {
    content: &'a str,
}

/// `resource/id[/suffix]` with the id percent-encoded.
fn record_path(resource: &str, id: &RecordId, suffix: Option<&str>) -> String {
    let id = crate::query::segment(id.as_str());
    match suffix {
        Some(suffix) => format!("{resource}/{id}/{suffix}"),
        None => format!("{resource}/{id}"),
    }
}

async fn get_payload<T: DeserializeOwned>(
    gateway: &Gateway,
    path: &str,
    config: RequestConfig,
) -> ApiResult<T> {
    gateway
        .get::<Payload<T>>(path, config)
        .await
        .map(Payload::into_inner)
}

async fn post_payload<T: DeserializeOwned, B: Serialize + ?Sized>(
    gateway: &Gateway,
    path: &str,
    body: &B,
) -> ApiResult<T> {
    gateway
        .post::<Payload<T>, B>(path, body)
        .await
        .map(Payload::into_inner)
}

async fn put_payload<T: DeserializeOwned, B: Serialize + ?Sized>(
    gateway: &Gateway,
    path: &str,
    body: &B,
) -> ApiResult<T> {
    gateway
        .put::<Payload<T>, B>(path, body)
        .await
        .map(Payload::into_inner)
}

async fn patch_payload<T: DeserializeOwned, B: Serialize + ?Sized>(
    gateway: &Gateway,
    path: &str,
    body: &B,
) -> ApiResult<T> {
    gateway
        .patch::<Payload<T>, B>(path, body)
        .await
        .map(Payload::into_inner)
}
