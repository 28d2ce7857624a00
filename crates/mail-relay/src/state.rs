//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::upstream::Upstream;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Forwarder for the upstream mail API.
    pub upstream: Upstream,
    /// Name reported by the health endpoint.
    pub service_name: Arc<str>,
}

impl AppState {
    /// Create new application state.
    pub fn new(upstream: Upstream, service_name: impl Into<Arc<str>>) -> Self {
        Self {
            upstream,
            service_name: service_name.into(),
        }
    }

    /// Build state from relay configuration.
    pub fn from_config(config: &RelayConfig) -> crate::error::Result<Self> {
        let upstream = Upstream::new(&config.upstream_url, config.upstream_timeout)?;
        Ok(Self::new(upstream, config.service_name.as_str()))
    }
}
