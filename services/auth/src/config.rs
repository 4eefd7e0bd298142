//! Session client configuration

use anyhow::Result;

/// Default primary auth API
pub const DEFAULT_API_URL: &str = "https://api.balanjo.web.id";

/// Default fallback auth API
pub const DEFAULT_FALLBACK_URL: &str = "https://dummyjson.com";

/// Session client configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL of the primary auth API
    pub api_url: String,
    /// Base URL of the fallback auth API, tried after a 5xx from the primary
    pub fallback_url: Option<String>,
    /// Access token lifetime assumed when the server states none (default: 1 hour)
    pub token_ttl_secs: u64,
    /// Lifetime requested from the refresh endpoint in minutes (default: 60)
    pub refresh_expires_in_mins: u64,
    /// HTTP request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
}

impl AuthConfig {
    /// Configuration for the given primary API with every other value defaulted
    /// and no fallback
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_url(api_url.into()),
            fallback_url: None,
            token_ttl_secs: 3600,
            refresh_expires_in_mins: 60,
            request_timeout_secs: 30,
        }
    }

    /// Set the fallback API
    pub fn with_fallback_url(mut self, fallback_url: impl Into<String>) -> Self {
        self.fallback_url = Some(normalize_url(fallback_url.into()));
        self
    }

    /// Create a new AuthConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AUTH_API_URL`: Primary auth API (default: "https://api.balanjo.web.id")
    /// - `AUTH_FALLBACK_URL`: Fallback auth API (default: "https://dummyjson.com", empty disables)
    /// - `AUTH_TOKEN_TTL_SECS`: Assumed access token lifetime (default: 3600)
    /// - `AUTH_REFRESH_EXPIRES_IN_MINS`: Lifetime requested on refresh (default: 60)
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: HTTP request timeout (default: 30)
    pub fn from_env() -> Result<Self> {
        let api_url =
            std::env::var("AUTH_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        ensure_http("AUTH_API_URL", &api_url)?;

        let fallback_url = match std::env::var("AUTH_FALLBACK_URL") {
            Ok(url) if url.trim().is_empty() => None,
            Ok(url) => Some(url),
            Err(_) => Some(DEFAULT_FALLBACK_URL.to_string()),
        };
        if let Some(url) = &fallback_url {
            ensure_http("AUTH_FALLBACK_URL", url)?;
        }

        let token_ttl_secs = std::env::var("AUTH_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string()) // 1 hour
            .parse()
            .unwrap_or(3600);

        let refresh_expires_in_mins = std::env::var("AUTH_REFRESH_EXPIRES_IN_MINS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        let request_timeout_secs = std::env::var("AUTH_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        Ok(AuthConfig {
            api_url: normalize_url(api_url),
            fallback_url: fallback_url.map(normalize_url),
            token_ttl_secs,
            refresh_expires_in_mins,
            request_timeout_secs,
        })
    }
}

fn ensure_http(var: &str, url: &str) -> Result<()> {
    let url = url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must be an http(s) URL, got: {}", var, url);
    }
    Ok(())
}

fn normalize_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "AUTH_API_URL",
        "AUTH_FALLBACK_URL",
        "AUTH_TOKEN_TTL_SECS",
        "AUTH_REFRESH_EXPIRES_IN_MINS",
        "AUTH_REQUEST_TIMEOUT_SECS",
    ];

    fn clear_env() {
        unsafe {
            for var in VARS {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_auth_config_from_env() {
        clear_env();

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.fallback_url.as_deref(), Some(DEFAULT_FALLBACK_URL));
        assert_eq!(config.token_ttl_secs, 3600);
        assert_eq!(config.refresh_expires_in_mins, 60);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    #[serial]
    fn test_auth_config_from_env_with_custom_values() {
        unsafe {
            std::env::set_var("AUTH_API_URL", "http://localhost:3000/");
            std::env::set_var("AUTH_FALLBACK_URL", "");
            std::env::set_var("AUTH_TOKEN_TTL_SECS", "120");
            std::env::set_var("AUTH_REFRESH_EXPIRES_IN_MINS", "not-a-number");
            std::env::set_var("AUTH_REQUEST_TIMEOUT_SECS", "5");
        }

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.fallback_url, None);
        assert_eq!(config.token_ttl_secs, 120);
        assert_eq!(config.refresh_expires_in_mins, 60);
        assert_eq!(config.request_timeout_secs, 5);

        // Clean up
        clear_env();
    }

    #[test]
    #[serial]
    fn test_auth_config_rejects_non_http_url() {
        unsafe {
            std::env::set_var("AUTH_API_URL", "ftp://example.com");
        }
        assert!(AuthConfig::from_env().is_err());
        clear_env();

        unsafe {
            std::env::set_var("AUTH_FALLBACK_URL", "dummyjson.com");
        }
        let err = AuthConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("AUTH_FALLBACK_URL"));
        clear_env();
    }

    #[test]
    fn test_builder_normalizes_urls() {
        let config = AuthConfig::new("http://a.test/").with_fallback_url("http://b.test//");
        assert_eq!(config.api_url, "http://a.test");
        assert_eq!(config.fallback_url.as_deref(), Some("http://b.test"));
        assert_eq!(config.token_ttl_secs, 3600);
    }
}
