//! Forwarding of local requests to the upstream mail API.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::Client;
use tracing::debug;

use crate::error::RelayError;

/// Body of an upstream reply after best-effort parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// No content (status 204). The body was never read.
    Empty,
    /// The body parsed as JSON.
    Json(serde_json::Value),
    /// Anything else, kept byte-for-byte.
    Text(Bytes),
}

/// Classify an upstream body.
///
/// A 204 is always `Empty`, whatever the declared content type. Bodies that
/// fail to parse as JSON, including empty ones, come back as `Text`.
pub fn normalize_body(status: StatusCode, raw: Bytes) -> UpstreamBody {
    if status == StatusCode::NO_CONTENT {
        return UpstreamBody::Empty;
    }

    match serde_json::from_slice(&raw) {
        Ok(value) => UpstreamBody::Json(value),
        Err(_) => UpstreamBody::Text(raw),
    }
}

/// Whether requests with this method carry a body upstream.
pub fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// A local request to be replayed against the upstream API.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Upstream path, starting with `/`.
    pub path: String,
    pub authorization: Option<HeaderValue>,
    pub body: Bytes,
}

impl ForwardRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            authorization: None,
            body: Bytes::new(),
        }
    }

    pub fn with_authorization(mut self, value: Option<HeaderValue>) -> Self {
        self.authorization = value;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }
}

/// Upstream reply, ready to be handed back to the caller.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: UpstreamBody,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        match self.body {
            UpstreamBody::Empty => StatusCode::NO_CONTENT.into_response(),
            UpstreamBody::Json(value) => (self.status, Json(value)).into_response(),
            UpstreamBody::Text(raw) => (
                self.status,
                [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                raw,
            )
                .into_response(),
        }
    }
}

/// Stateless forwarder bound to one upstream base URL.
#[derive(Clone)]
pub struct Upstream {
    http: Client,
    base_url: Arc<str>,
}

impl Upstream {
    /// Create a forwarder. Without a timeout, upstream calls may hang indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, RelayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    /// Upstream base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replay a request upstream and classify the reply.
    ///
    /// Only transport failures are errors; any upstream status is returned as-is.
    pub async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse, RelayError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, path = %request.path, "Forwarding upstream");

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(auth) = request.authorization {
            builder = builder.header(AUTHORIZATION, auth);
        }

        // Sent as received once it parses as JSON.
        if is_mutating(&request.method) && !request.body.is_empty() {
            serde_json::from_slice::<serde_json::Value>(&request.body)?;
            builder = builder.body(request.body);
        }

        let response = builder.send().await?;
        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);

        if status == StatusCode::NO_CONTENT {
            debug!(path = %request.path, "Upstream returned no content");
            return Ok(UpstreamResponse {
                status,
                body: UpstreamBody::Empty,
            });
        }

        let raw = response.bytes().await?;
        debug!(path = %request.path, status = status.as_u16(), bytes = raw.len(), "Upstream replied");

        Ok(UpstreamResponse {
            status,
            body: normalize_body(status, raw),
        })
    }
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream")
            .field("base_url", &self.base_url)
            .finish()
    }
}
