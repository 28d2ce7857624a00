//! Relay between the disposable-mail front end and the upstream mail API.
//!
//! The relay holds no state between calls. Each local route maps onto one
//! upstream path; the caller's `Authorization` header and JSON body are
//! carried over, and the upstream reply is handed back with its status:
//!
//! - 204 replies come back empty, without the body being read
//! - JSON bodies are parsed and returned as JSON
//! - anything else is returned verbatim as plain text
//! - transport failures become a 500 with an `error`/`details` payload
//!
//! The route set is mounted at the root and again under a configurable
//! prefix (`/api` by default).

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod upstream;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, RelayConfig};
pub use error::RelayError;
pub use state::AppState;
pub use upstream::{normalize_body, ForwardRequest, Upstream, UpstreamBody, UpstreamResponse};

/// Build the complete application for a configuration.
pub fn app(config: &RelayConfig) -> Result<Router, RelayError> {
    let state = AppState::from_config(config)?;

    let mut app = routes::router(config.api_prefix.as_deref());
    if let Some(dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    Ok(app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
