//! Auth API response schemas
//!
//! Two server shapes are understood: the primary API (`access_token` plus a
//! nested `data` user) and the fallback API (`token` with flat user fields on
//! login, `accessToken`/`refreshToken` on refresh). Anything else is a decode
//! error.

use serde::Deserialize;

use super::user::User;

/// Role assigned to users coming from the fallback API
pub const FALLBACK_ROLE: &str = "User";

/// Active status assigned to users coming from the fallback API
pub const FALLBACK_ACTIVE: &str = "active";

/// Login response, primary schema tried first
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Primary(PrimaryTokenBody),
    Fallback(FallbackLoginBody),
}

/// Refresh response, primary schema tried first
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefreshResponse {
    Primary(PrimaryTokenBody),
    Fallback(FallbackRefreshBody),
}

/// Primary API token body, shared by login and refresh
#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryTokenBody {
    pub access_token: String,
    #[serde(default)]
    pub data: Option<User>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Fallback API login body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackLoginBody {
    pub token: String,
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Fallback API refresh body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackRefreshBody {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Normalized result of a successful login or refresh
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
    /// Lifetime in seconds, when the server stated one
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    /// Absolute expiry in milliseconds, using `default_ttl_secs` when the
    /// server did not state a positive lifetime
    pub fn expiration_from(&self, now_ms: i64, default_ttl_secs: u64) -> i64 {
        let ttl_secs = self
            .expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or(default_ttl_secs as i64);
        now_ms.saturating_add(ttl_secs.saturating_mul(1000))
    }
}

impl From<PrimaryTokenBody> for TokenGrant {
    fn from(body: PrimaryTokenBody) -> Self {
        TokenGrant {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            user: body.data,
            expires_in: body.expires_in,
        }
    }
}

impl From<FallbackLoginBody> for TokenGrant {
    fn from(body: FallbackLoginBody) -> Self {
        let name = [body.first_name.as_deref(), body.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        let user = User {
            name: (!name.is_empty()).then_some(name),
            email: body.email,
            avatar_url: body.image,
            role: Some(FALLBACK_ROLE.to_string()),
            active: Some(FALLBACK_ACTIVE.to_string()),
            ..User::with_id(body.id)
        };

        TokenGrant {
            access_token: body.token,
            refresh_token: body.refresh_token,
            user: Some(user),
            expires_in: None,
        }
    }
}

impl From<FallbackRefreshBody> for TokenGrant {
    fn from(body: FallbackRefreshBody) -> Self {
        TokenGrant {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            user: None,
            expires_in: body.expires_in,
        }
    }
}

impl From<LoginResponse> for TokenGrant {
    fn from(response: LoginResponse) -> Self {
        match response {
            LoginResponse::Primary(body) => body.into(),
            LoginResponse::Fallback(body) => body.into(),
        }
    }
}

impl From<RefreshResponse> for TokenGrant {
    fn from(response: RefreshResponse) -> Self {
        match response {
            RefreshResponse::Primary(body) => body.into(),
            RefreshResponse::Fallback(body) => body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primary_login_schema() {
        let response: LoginResponse = serde_json::from_value(json!({
            "access_token": "T",
            "data": {"id": 1, "name": "Ana", "email": "ana@example.com", "role": "Admin"}
        }))
        .unwrap();
        assert!(matches!(response, LoginResponse::Primary(_)));

        let grant = TokenGrant::from(response);
        assert_eq!(grant.access_token, "T");
        assert_eq!(grant.user.as_ref().map(|u| u.id), Some(1));
        assert_eq!(grant.refresh_token, None);
    }

    #[test]
    fn test_primary_login_with_loosely_typed_user() {
        let response: LoginResponse = serde_json::from_value(json!({
            "access_token": "T",
            "data": {"id": 1, "name": "Ana", "active": 1, "profile": {"bio": "hi"}}
        }))
        .unwrap();
        assert!(matches!(response, LoginResponse::Primary(_)));

        let user = TokenGrant::from(response).user.unwrap();
        assert_eq!(user.active.as_deref(), Some("1"));
        assert_eq!(user.name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_fallback_login_schema() {
        let response: LoginResponse = serde_json::from_value(json!({
            "token": "T2",
            "id": 7,
            "firstName": "A",
            "lastName": "B",
            "email": "a@b.com",
            "image": "u"
        }))
        .unwrap();
        assert!(matches!(response, LoginResponse::Fallback(_)));

        let grant = TokenGrant::from(response);
        let user = grant.user.unwrap();
        assert_eq!(grant.access_token, "T2");
        assert_eq!(user.id, 7);
        assert_eq!(user.name.as_deref(), Some("A B"));
        assert_eq!(user.role.as_deref(), Some("User"));
        assert_eq!(user.active.as_deref(), Some("active"));
        assert_eq!(user.avatar_url.as_deref(), Some("u"));
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_fallback_name_with_missing_part() {
        let response: LoginResponse =
            serde_json::from_value(json!({"token": "T", "id": 3, "firstName": "Solo"})).unwrap();
        let user = TokenGrant::from(response).user.unwrap();
        assert_eq!(user.name.as_deref(), Some("Solo"));
    }

    #[test]
    fn test_unknown_login_schema_is_rejected() {
        let result = serde_json::from_value::<LoginResponse>(json!({"jwt": "T", "id": 1}));
        assert!(result.is_err());

        // Fallback shape without a user id is not guessed at either
        let result = serde_json::from_value::<LoginResponse>(json!({"token": "T"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_refresh_schemas() {
        let primary: RefreshResponse =
            serde_json::from_value(json!({"access_token": "N", "expires_in": 120})).unwrap();
        let grant = TokenGrant::from(primary);
        assert_eq!(grant.access_token, "N");
        assert_eq!(grant.expires_in, Some(120));
        assert_eq!(grant.user, None);

        let fallback: RefreshResponse = serde_json::from_value(json!({
            "accessToken": "N2",
            "refreshToken": "R2",
            "expiresIn": 60
        }))
        .unwrap();
        let grant = TokenGrant::from(fallback);
        assert_eq!(grant.access_token, "N2");
        assert_eq!(grant.refresh_token.as_deref(), Some("R2"));
        assert_eq!(grant.expires_in, Some(60));

        let legacy: RefreshResponse = serde_json::from_value(json!({"token": "N3"})).unwrap();
        assert_eq!(TokenGrant::from(legacy).access_token, "N3");
    }

    #[test]
    fn test_expiration_defaults_to_ttl() {
        let mut grant = TokenGrant {
            access_token: "T".to_string(),
            refresh_token: None,
            user: None,
            expires_in: None,
        };
        assert_eq!(grant.expiration_from(1_000, 3600), 1_000 + 3_600_000);

        grant.expires_in = Some(60);
        assert_eq!(grant.expiration_from(1_000, 3600), 61_000);

        grant.expires_in = Some(0);
        assert_eq!(grant.expiration_from(1_000, 3600), 1_000 + 3_600_000);
    }
}
