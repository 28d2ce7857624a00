//! Message endpoints. The caller's `Authorization` header is passed through;
//! request bodies are dropped by the forwarder for these verbs.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method};

use super::relay;
use crate::error::Result;
use crate::state::AppState;
use crate::upstream::UpstreamResponse;

fn message_path(id: &str) -> String {
    format!("/messages/{}", urlencoding::encode(id))
}

/// `GET /messages`
pub async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<UpstreamResponse> {
    relay(&state, Method::GET, "/messages".to_string(), &headers, Bytes::new()).await
}

/// `GET /messages/:id`
pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse> {
    relay(&state, Method::GET, message_path(&id), &headers, body).await
}

/// `DELETE /messages/:id`
pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse> {
    relay(&state, Method::DELETE, message_path(&id), &headers, body).await
}
