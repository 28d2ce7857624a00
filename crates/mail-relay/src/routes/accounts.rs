//! Domain, account and token endpoints.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method};

use super::relay;
use crate::error::Result;
use crate::state::AppState;
use crate::upstream::UpstreamResponse;

/// `GET /domains`
pub async fn list_domains(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<UpstreamResponse> {
    relay(&state, Method::GET, "/domains".to_string(), &headers, Bytes::new()).await
}

/// `POST /accounts` with `{address, password}`.
pub async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse> {
    relay(&state, Method::POST, "/accounts".to_string(), &headers, body).await
}

/// `POST /token` with `{address, password}`.
pub async fn create_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse> {
    relay(&state, Method::POST, "/token".to_string(), &headers, body).await
}
