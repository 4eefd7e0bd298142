//! HTTP client for the remote auth API
//!
//! Every call goes to the primary API first. When the primary answers with a
//! 5xx and a fallback API is configured, login and refresh are replayed once
//! against the fallback using its own request shape. There are no retries
//! beyond that single fallback attempt.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, info, warn};

use crate::{
    config::AuthConfig,
    error::{AuthError, AuthResult},
    models::{LoginResponse, RefreshResponse, TokenGrant},
    payload::rejection,
};

/// Request body for the primary login endpoint
#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Request body for the fallback login endpoint
#[derive(Serialize)]
struct FallbackLoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Request body for both refresh endpoints
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in_mins: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

/// Remote auth API client
#[derive(Clone)]
pub struct AuthApi {
    client: Client,
    api_url: String,
    fallback_url: Option<String>,
    refresh_expires_in_mins: u64,
}

impl AuthApi {
    /// Create a new client from configuration
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            fallback_url: config.fallback_url.clone(),
            refresh_expires_in_mins: config.refresh_expires_in_mins,
        })
    }

    /// Submit credentials and return the normalized grant
    pub async fn login(&self, identifier: &str, secret: &str) -> AuthResult<TokenGrant> {
        info!("Attempting login for user: {}", identifier);

        let url = format!("{}/api/auth/login", self.api_url);
        let body = LoginRequest {
            email: identifier,
            password: secret,
        };
        let mut response = self.client.post(&url).json(&body).send().await?;
        debug!("Login response status: {}", response.status());

        if response.status().is_server_error() {
            if let Some(fallback_url) = &self.fallback_url {
                warn!(
                    "Primary login failed with {}, trying fallback",
                    response.status()
                );
                let url = format!("{}/auth/login", fallback_url);
                let body = FallbackLoginRequest {
                    username: identifier,
                    password: secret,
                };
                response = self.client.post(&url).json(&body).send().await?;
                debug!("Fallback login response status: {}", response.status());
            }
        }

        decode::<LoginResponse>(response, "login").await
    }

    /// Invalidate the access token on the server
    pub async fn logout(&self, access_token: &str) -> AuthResult<()> {
        let url = format!("{}/api/auth/logout", self.api_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(rejection(status.as_u16(), &body));
        }

        info!("Logout API call completed");
        Ok(())
    }

    /// Exchange the refresh token, or the session cookie when there is none,
    /// for a new access token
    pub async fn refresh(&self, refresh_token: Option<&str>) -> AuthResult<TokenGrant> {
        info!(
            "Refreshing access token ({})",
            if refresh_token.is_some() {
                "refresh token"
            } else {
                "cookie"
            }
        );

        let body = RefreshRequest {
            expires_in_mins: Some(self.refresh_expires_in_mins),
            refresh_token,
        };

        let url = format!("{}/api/auth/refresh", self.api_url);
        let mut response = self.client.post(&url).json(&body).send().await?;
        debug!("Refresh response status: {}", response.status());

        if response.status().is_server_error() {
            if let Some(fallback_url) = &self.fallback_url {
                warn!(
                    "Primary refresh failed with {}, trying fallback",
                    response.status()
                );
                let url = format!("{}/auth/refresh", fallback_url);
                response = self.client.post(&url).json(&body).send().await?;
                debug!("Fallback refresh response status: {}", response.status());
            }
        }

        decode::<RefreshResponse>(response, "refresh").await
    }
}

/// Read a response body, mapping failures to rejections and successes to a
/// grant through the given schema
async fn decode<T>(response: Response, action: &str) -> AuthResult<TokenGrant>
where
    T: DeserializeOwned + Into<TokenGrant>,
{
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        error!("{} failed with status {}", action, status);
        return Err(rejection(status.as_u16(), &body));
    }

    let parsed: T = serde_json::from_str(&body).map_err(|e| {
        error!("Failed to decode {} response: {}", action, e);
        AuthError::Decode(format!("{} response matched no known schema", action))
    })?;

    Ok(parsed.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_request_omits_missing_token() {
        let body = RefreshRequest {
            expires_in_mins: Some(60),
            refresh_token: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"expiresInMins": 60})
        );

        let body = RefreshRequest {
            expires_in_mins: Some(30),
            refresh_token: Some("R"),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"expiresInMins": 30, "refreshToken": "R"})
        );
    }
}
