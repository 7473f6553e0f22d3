//! Client configuration.
//!
//! Resolution order for each setting: explicit builder call (CLI flag), then
//! the run-time environment, then the value baked in at build time, then the
//! default.

use std::time::Duration;

/// Backend base URL when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/v1";

/// Whole-request timeout for backend calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP/TLS connect timeout for backend calls.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Environment variable overriding the backend base URL.
pub const API_URL_VAR: &str = "CAREBRIDGE_API_URL";

/// Environment variable overriding the media server URL.
pub const MEDIA_URL_VAR: &str = "CAREBRIDGE_MEDIA_URL";

/// Media server URL baked in at build time, if any.
pub const BUILD_MEDIA_URL: Option<&str> = option_env!("CAREBRIDGE_MEDIA_URL");

/// Backend API URL baked in at build time, if any.
pub const BUILD_API_URL: Option<&str> = option_env!("CAREBRIDGE_API_URL");

/// Session client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash.
    pub api_base_url: String,
    /// Media server URL that takes precedence over the one in the token
    /// response. `None` to use the backend's.
    pub media_url_override: Option<String>,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: BUILD_API_URL.unwrap_or(DEFAULT_API_BASE_URL).to_string(),
            media_url_override: BUILD_MEDIA_URL.map(str::to_string),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());

        if let Some(url) = non_blank(API_URL_VAR) {
            config = config.with_api_base_url(url);
        }
        if let Some(url) = non_blank(MEDIA_URL_VAR) {
            config.media_url_override = Some(url);
        }
        config
    }

    /// Set the backend base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the media server override.
    #[must_use]
    pub fn with_media_url_override(mut self, url: impl Into<String>) -> Self {
        self.media_url_override = Some(url.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn lookup_overrides_defaults() {
        let vars = HashMap::from([
            (API_URL_VAR, "https://api.example.test/v1/".to_string()),
            (MEDIA_URL_VAR, "wss://media.example.test".to_string()),
        ]);
        let config = ClientConfig::from_lookup(|k| vars.get(k).cloned());

        assert_eq!(config.api_base_url, "https://api.example.test/v1");
        assert_eq!(config.media_url_override.as_deref(), Some("wss://media.example.test"));
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = ClientConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config, ClientConfig::default());
    }
}
