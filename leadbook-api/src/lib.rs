//! HTTP gateway and typed resource services for the Leadbook CRM backend.
//!
//! [`Gateway`] is the only component that talks to the network. It injects
//! the bearer token of the current session, classifies failures into
//! [`ApiError`], and on a 401 hands control to the installed
//! [`AuthProvider`] so the session is torn down before the caller sees the
//! error. [`CrmApi`] groups one service per backend resource on top of it.

pub mod config;
pub mod error;
pub mod gateway;
pub mod query;
pub mod services;

pub use config::{API_TIMEOUT_ENV, API_URL_ENV, DEFAULT_API_URL, GatewayConfig};
pub use error::{ApiError, ApiResult};
pub use gateway::{AuthProvider, Body, Gateway, RequestConfig, Upload};
pub use query::build_query_string;
pub use reqwest::Method;
pub use services::{AuthApi, ClientsApi, CrmApi, DashboardApi, LeadsApi, TeamsApi, UsersApi};
pub use services::{ClientQuery, LeadQuery};
