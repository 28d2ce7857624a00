//! Route handlers for the relay.

pub mod accounts;
pub mod health;
pub mod messages;

use axum::body::Bytes;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method};
use axum::routing::{get, post};
use axum::Router;

use crate::error::Result;
use crate::state::AppState;
use crate::upstream::{ForwardRequest, UpstreamResponse};

/// Build the route table, mounted at the root and, if given, under `prefix`.
pub fn router(prefix: Option<&str>) -> Router<AppState> {
    let app = routes();
    match prefix {
        Some(prefix) => app.nest(prefix, routes()),
        None => app,
    }
}

fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Mailbox provisioning
        .route("/domains", get(accounts::list_domains))
        .route("/accounts", post(accounts::create_account))
        .route("/token", post(accounts::create_token))
        // Messages (bearer required upstream)
        .route("/messages", get(messages::list_messages))
        .route(
            "/messages/:id",
            get(messages::get_message).delete(messages::delete_message),
        )
}

/// Replay a local request upstream, carrying over the caller's bearer header.
pub(crate) async fn relay(
    state: &AppState,
    method: Method,
    path: String,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse> {
    let request = ForwardRequest::new(method, path)
        .with_authorization(headers.get(AUTHORIZATION).cloned())
        .with_body(body);

    state.upstream.forward(request).await
}
