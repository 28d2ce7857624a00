//! HTTP client for the mail relay.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::MailApi;
use crate::error::SessionError;
use crate::types::{
    Account, AccountRequest, Collection, Domain, MessageDetail, MessageSummary, TokenResponse,
};

/// Client for the relay's mailbox routes.
///
/// No request timeout is set: a hung upstream call stays pending.
#[derive(Clone)]
pub struct RelayClient {
    http: Client,
    base_url: String,
}

impl RelayClient {
    /// Create a client for the relay at `base_url` (including any mount prefix).
    pub fn new(base_url: impl Into<String>) -> Result<Self, SessionError> {
        let http = Client::builder().build().map_err(SessionError::Http)?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn message_url(&self, id: &str) -> String {
        self.url(&format!("/messages/{}", urlencoding::encode(id)))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, token: Option<&str>) -> Result<T, SessionError> {
        debug!("GET {}", url);
        let mut request = self.http.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        read_json(request.send().await?).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &AccountRequest,
    ) -> Result<T, SessionError> {
        debug!("POST {}", url);
        let response = self.http.post(url).json(body).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl MailApi for RelayClient {
    async fn domains(&self) -> Result<Vec<Domain>, SessionError> {
        let domains: Collection<Domain> = self.get(&self.url("/domains"), None).await?;
        Ok(domains.into_vec())
    }

    async fn create_account(&self, request: &AccountRequest) -> Result<Account, SessionError> {
        self.post(&self.url("/accounts"), request).await
    }

    async fn token(&self, request: &AccountRequest) -> Result<TokenResponse, SessionError> {
        self.post(&self.url("/token"), request).await
    }

    async fn messages(&self, token: &str) -> Result<Vec<MessageSummary>, SessionError> {
        let messages: Collection<MessageSummary> =
            self.get(&self.url("/messages"), Some(token)).await?;
        Ok(messages.into_vec())
    }

    async fn message(&self, token: &str, id: &str) -> Result<MessageDetail, SessionError> {
        self.get(&self.message_url(id), Some(token)).await
    }

    async fn delete_message(&self, token: &str, id: &str) -> Result<(), SessionError> {
        let url = self.message_url(id);
        debug!("DELETE {}", url);
        let response = self.http.delete(&url).bearer_auth(token).send().await?;
        ensure_success(response).await.map(|_| ())
    }
}

impl std::fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Turn a non-2xx reply into [`SessionError::Upstream`].
async fn ensure_success(response: Response) -> Result<Response, SessionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SessionError::Upstream {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, SessionError> {
    let response = ensure_success(response).await?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Best human-readable message in an error reply.
///
/// Looks at the usual JSON error fields first, then the raw body, then the
/// status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "detail", "hydra:description", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
