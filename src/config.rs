//! Sync Configuration
//!
//! Server base URL, bearer credential, and timing knobs for the sync engine.
//! The credential is issued by the auth layer and set at runtime; it is held
//! behind a lock so a running engine observes token changes immediately.

use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000/api/v1";

/// Time budget for a full read batch
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Time budget for a single mutation write (reuses the read budget)
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between periodic full syncs
const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Sync engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    server_url: String,
    token: Arc<RwLock<Option<String>>>,
    /// Timeout for the full read batch
    pub read_timeout: Duration,
    /// Timeout for a single mutation write
    pub write_timeout: Duration,
    /// Interval between periodic full syncs
    pub sync_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let server_url = std::env::var("WELLSYNC_API_URL")
            .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        Self {
            server_url,
            token: Arc::new(RwLock::new(None)),
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

impl SyncConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration pointing at an explicit server URL
    pub fn with_server_url(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// Set the bearer token
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().expect("token lock poisoned") = token;
    }

    /// Get the bearer token
    pub fn bearer_token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    /// Clear the token (logout)
    pub fn clear_token(&self) {
        self.set_token(None);
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SyncConfig::with_server_url("http://127.0.0.1:3000/api/v1");
        assert!(config.bearer_token().is_none());
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.sync_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_set_and_clear_token() {
        let config = SyncConfig::with_server_url("http://localhost:3000");
        config.set_token(Some("test_token".to_string()));
        assert_eq!(config.bearer_token(), Some("test_token".to_string()));
        config.clear_token();
        assert!(config.bearer_token().is_none());
    }

    #[test]
    fn test_token_shared_across_clones() {
        let config = SyncConfig::with_server_url("http://localhost:3000");
        let clone = config.clone();
        config.set_token(Some("abc".to_string()));
        assert_eq!(clone.bearer_token(), Some("abc".to_string()));
    }

    #[test]
    fn test_api_url() {
        let config = SyncConfig::with_server_url("http://127.0.0.1:3000/api/v1");
        let url = config.api_url("/wellness/mood/history");
        assert_eq!(url, "http://127.0.0.1:3000/api/v1/wellness/mood/history");
    }
}
