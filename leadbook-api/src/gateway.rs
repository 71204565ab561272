//! The single outbound HTTP client.
//!
//! Every request goes through [`Gateway`]: it attaches the session's bearer
//! token, unwraps successful responses into the caller's type, and turns
//! failures into [`ApiError`]. A 401 from any endpoint tears the session down
//! through the installed [`AuthProvider`] before the error is returned.

use crate::config::GatewayConfig;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use leadbook_types::ErrorBody;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Session hooks the gateway calls into.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current bearer token, if a session exists.
    async fn bearer_token(&self) -> Option<String>;

    /// Called once per 401 response, before the error reaches the caller.
    async fn on_unauthorized(&self);
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters appended to the URL.
    pub query: Vec<(String, String)>,
    /// Overrides the gateway-wide timeout.
    pub timeout: Option<Duration>,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every set field of `params` as query parameters.
    pub fn with_params<T: Serialize + ?Sized>(mut self, params: &T) -> Self {
        self.query.extend(crate::query::query_pairs(params));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A file sent as `multipart/form-data` under the `file` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    fn into_form(self) -> ApiResult<Form> {
        let mut part = Part::bytes(self.bytes).file_name(self.file_name);
        if let Some(mime) = self.mime_type {
            part = part
                .mime_str(&mime)
                .map_err(|e| ApiError::Config(format!("invalid mime type {mime}: {e}")))?;
        }
        Ok(Form::new().part("file", part))
    }
}

/// Request body variants.
#[derive(Debug, Default)]
pub enum Body {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Upload),
}

impl Body {
    /// Serializes `value` as a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> ApiResult<Self> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }
}

/// Authenticated HTTP gateway to the CRM backend.
pub struct Gateway {
    config: GatewayConfig,
    client: Client,
    auth: RwLock<Option<Arc<dyn AuthProvider>>>,
}

impl Gateway {
    /// Creates a gateway with no session attached.
    pub fn new(config: GatewayConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ApiError::Config(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, user_agent);

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            auth: RwLock::new(None),
        })
    }

    /// Installs the session hooks. Replaces any previous provider.
    pub fn set_auth_provider(&self, provider: Arc<dyn AuthProvider>) {
        *self.auth.write().unwrap_or_else(PoisonError::into_inner) = Some(provider);
    }

    /// Detaches the session hooks; later requests go out unauthenticated.
    pub fn clear_auth_provider(&self) {
        *self.auth.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn auth_provider(&self) -> Option<Arc<dyn AuthProvider>> {
        self.auth
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sends a request and returns the successful response.
    ///
    /// Non-2xx responses never come back as `Ok`.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Body,
        config: RequestConfig,
    ) -> ApiResult<Response> {
        let url = self.config.url(path);
        let mut builder = self.client.request(method.clone(), &url);

        if !config.query.is_empty() {
            builder = builder.query(&config.query);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        for (name, value) in &config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let provider = self.auth_provider();
        if let Some(provider) = &provider {
            if let Some(token) = provider.bearer_token().await {
                builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
            }
        }

        builder = match body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(upload) => builder.multipart(upload.into_form()?),
        };

        debug!("{method} {url}");
        let response = builder.send().await.map_err(|e| {
            warn!("{method} {url} failed without a response: {e}");
            ApiError::from_transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        Err(self.classify(status, body, &method, &url, provider).await)
    }

    async fn classify(
        &self,
        status: StatusCode,
        body: ErrorBody,
        method: &Method,
        url: &str,
        provider: Option<Arc<dyn AuthProvider>>,
    ) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => {
                warn!("{method} {url} returned 401, ending session");
                if let Some(provider) = provider {
                    provider.on_unauthorized().await;
                }
                ApiError::Unauthorized {
                    message: body.message,
                }
            }
            StatusCode::FORBIDDEN => {
                warn!(
                    "{method} {url} denied: {}",
                    body.message.as_deref().unwrap_or("insufficient permission")
                );
                ApiError::Forbidden {
                    message: body.message,
                }
            }
            s if s.is_server_error() => {
                error!(
                    "{method} {url} failed with {s}: {}",
                    body.message.as_deref().unwrap_or("internal server error")
                );
                ApiError::Server {
                    status: s.as_u16(),
                    message: body.message,
                }
            }
            s => ApiError::Rejected {
                status: s.as_u16(),
                message: body.message,
                errors: body.errors,
            },
        }
    }

    /// Sends a request and decodes the response body as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Body,
        config: RequestConfig,
    ) -> ApiResult<T> {
        let response = self.execute(method, path, body, config).await?;
        let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            debug!("undecodable body from {path}: {e}");
            ApiError::Decode(e.to_string())
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, config: RequestConfig) -> ApiResult<T> {
        self.request(Method::GET, path, Body::Empty, config).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::POST, path, Body::json(body)?, RequestConfig::default())
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::PUT, path, Body::json(body)?, RequestConfig::default())
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::PATCH, path, Body::json(body)?, RequestConfig::default())
            .await
    }

    /// Sends a request whose response body the caller does not need.
    pub async fn send(&self, method: Method, path: &str, body: Body) -> ApiResult<()> {
        self.execute(method, path, body, RequestConfig::default())
            .await
            .map(|_| ())
    }

    /// Posts a file as multipart form data and decodes the response.
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, upload: Upload) -> ApiResult<T> {
        self.request(Method::POST, path, Body::Multipart(upload), RequestConfig::default())
            .await
    }

    /// Fetches a raw body (exports, attachments).
    pub async fn download(&self, path: &str, config: RequestConfig) -> ApiResult<Vec<u8>> {
        let response = self.execute(Method::GET, path, Body::Empty, config).await?;
        let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
        Ok(bytes.to_vec())
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("authenticated", &self.auth_provider().is_some())
            .finish()
    }
}
