//! Configuration types for mail-session.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::SessionError;

/// Interval between inbox refreshes when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for a mailbox session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the relay, including its mount prefix
    /// (e.g., "http://127.0.0.1:3001/api").
    pub relay_url: String,
    /// Directory holding the persisted credential.
    pub storage_dir: PathBuf,
    /// Interval between inbox refreshes.
    pub poll_interval: Duration,
}

impl SessionConfig {
    /// Create a new configuration with the given relay URL and storage directory.
    pub fn new(relay_url: impl Into<String>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            relay_url: relay_url.into().trim_end_matches('/').to_string(),
            storage_dir: storage_dir.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `MAIL_RELAY_URL` - Default: http://127.0.0.1:3001/api
    /// - `MAIL_SESSION_DIR` - Default: `<data dir>/tempmail`
    /// - `MAIL_POLL_INTERVAL_SECS` - Default: 10
    pub fn from_env() -> Result<Self, SessionError> {
        let relay_url =
            env::var("MAIL_RELAY_URL").unwrap_or_else(|_| "http://127.0.0.1:3001/api".to_string());

        let storage_dir = match env::var("MAIL_SESSION_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_storage_dir()?,
        };

        let poll_interval = match env::var("MAIL_POLL_INTERVAL_SECS") {
            Ok(value) => {
                let secs = value.parse::<u64>().map_err(|e| {
                    SessionError::Config(format!("Invalid MAIL_POLL_INTERVAL_SECS: {}", e))
                })?;
                if secs == 0 {
                    return Err(SessionError::Config(
                        "MAIL_POLL_INTERVAL_SECS must be at least 1".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self::new(relay_url, storage_dir).with_poll_interval(poll_interval))
    }
}

fn default_storage_dir() -> Result<PathBuf, SessionError> {
    dirs::data_dir()
        .map(|dir| dir.join("tempmail"))
        .ok_or_else(|| SessionError::Config("No data directory; set MAIL_SESSION_DIR".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_new() {
        let config = SessionConfig::new("http://localhost:3001/api/", "/tmp/mail");
        assert_eq!(config.relay_url, "http://localhost:3001/api");
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/mail"));
        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_with_poll_interval() {
        let config = SessionConfig::new("http://localhost:3001", "/tmp/mail")
            .with_poll_interval(Duration::from_millis(250));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }
}
