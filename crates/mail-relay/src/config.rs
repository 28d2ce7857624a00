//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default upstream mail provisioning API.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.mail.tm";

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Upstream API base URL, without trailing slash.
    pub upstream_url: String,
    /// Second mount point for the route set, e.g. `/api`.
    /// `None` means the routes are only mounted at the root.
    pub api_prefix: Option<String>,
    /// Name reported by the health endpoint.
    pub service_name: String,
    /// Directory holding the browser front end, if served by the relay.
    pub static_dir: Option<PathBuf>,
    /// Upstream request timeout. Unset means calls may hang indefinitely.
    pub upstream_timeout: Option<Duration>,
}

impl RelayConfig {
    /// Create a configuration for the given upstream with all other values defaulted.
    pub fn new(upstream_url: impl Into<String>) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            upstream_url: trim_base_url(&upstream_url.into()),
            api_prefix: Some("/api".to_string()),
            service_name: "mail-relay".to_string(),
            static_dir: None,
            upstream_timeout: None,
        }
    }

    /// Set the second mount prefix. See [`normalize_prefix`].
    pub fn with_api_prefix(mut self, prefix: &str) -> Self {
        self.api_prefix = normalize_prefix(prefix);
        self
    }

    /// Set the name reported by `/health`.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `RELAY_ADDR` | Server bind address | `127.0.0.1:3001` |
    /// | `RELAY_UPSTREAM_URL` | Upstream API base URL | `https://api.mail.tm` |
    /// | `RELAY_API_PREFIX` | Second mount prefix (`/` disables it) | `/api` |
    /// | `RELAY_SERVICE_NAME` | Name reported by `/health` | `mail-relay` |
    /// | `RELAY_STATIC_DIR` | Front end directory to serve | (none) |
    /// | `RELAY_UPSTREAM_TIMEOUT_SECS` | Upstream timeout in seconds | (none) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("RELAY_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3001".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let upstream_url =
            env::var("RELAY_UPSTREAM_URL").unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string());
        if !upstream_url.starts_with("http://") && !upstream_url.starts_with("https://") {
            return Err(ConfigError::InvalidUpstreamUrl(upstream_url));
        }

        let api_prefix = env::var("RELAY_API_PREFIX").unwrap_or_else(|_| "/api".to_string());

        let service_name =
            env::var("RELAY_SERVICE_NAME").unwrap_or_else(|_| "mail-relay".to_string());

        let static_dir = env::var("RELAY_STATIC_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let upstream_timeout = match env::var("RELAY_UPSTREAM_TIMEOUT_SECS") {
            Ok(value) => {
                let secs = value
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout(value))?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            addr,
            upstream_url: trim_base_url(&upstream_url),
            api_prefix: normalize_prefix(&api_prefix),
            service_name,
            static_dir,
            upstream_timeout,
        })
    }
}

/// Normalize a mount prefix to `/segment` form.
///
/// Returns `None` for an empty prefix or `/`, which would collide with the root mount.
pub fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{}", trimmed))
    }
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid RELAY_ADDR format")]
    InvalidAddr,

    #[error("RELAY_UPSTREAM_URL must be an http(s) URL, got {0:?}")]
    InvalidUpstreamUrl(String),

    #[error("RELAY_UPSTREAM_TIMEOUT_SECS must be a whole number of seconds, got {0:?}")]
    InvalidTimeout(String),
}
