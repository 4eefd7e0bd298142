//! Session model and related functionality

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::user::User;

/// Key of the persisted session record
pub const STORE_KEY: &str = "auth-store";

/// Version written alongside the persisted record
pub const PERSIST_VERSION: u32 = 0;

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Client-held authentication state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub is_authenticated: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
    /// Absolute expiry in milliseconds since the Unix epoch
    pub access_token_expiration: Option<i64>,
    /// Set once the store has attempted to load persisted state
    pub has_hydrated: bool,
}

impl Session {
    /// Whether the access token expiry has passed at `now_ms`
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        matches!(self.access_token_expiration, Some(expiration) if now_ms >= expiration)
    }

    /// Authenticated, holding a token, and not expired at `now_ms`
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.is_authenticated && self.access_token.is_some() && !self.is_expired_at(now_ms)
    }

    /// Whether there is anything a refresh could act on
    ///
    /// A profile left over from an expired session counts: the server may
    /// still hold a refresh cookie for it.
    pub fn has_credentials(&self) -> bool {
        self.access_token.is_some() || self.refresh_token.is_some() || self.user.is_some()
    }

    /// Drop the access token after it expired
    ///
    /// The refresh token and profile survive so the session can be renewed.
    pub fn expire(&mut self) {
        self.is_authenticated = false;
        self.access_token = None;
        self.access_token_expiration = None;
    }

    /// Drop every credential, keeping the hydration flag
    pub fn reset(&mut self) {
        *self = Session {
            has_hydrated: self.has_hydrated,
            ..Session::default()
        };
    }

    /// Merge a partial update into this session
    ///
    /// Without an explicit `is_authenticated`, supplying an access token marks
    /// the session authenticated and omitting it keeps the current flag. The
    /// flag is never left set without a token.
    pub fn apply(&mut self, update: SessionUpdate) {
        let is_authenticated = match (update.is_authenticated, &update.access_token) {
            (Some(explicit), _) => explicit,
            (None, Some(_)) => true,
            (None, None) => self.is_authenticated,
        };

        if let Some(access_token) = update.access_token {
            self.access_token = Some(access_token);
        }
        if let Some(refresh_token) = update.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        if let Some(user) = update.user {
            self.user = Some(user);
        }
        if let Some(expiration) = update.access_token_expiration {
            self.access_token_expiration = Some(expiration);
        }

        self.is_authenticated = is_authenticated && self.access_token.is_some();
    }

    /// Persisted form of this session
    pub fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            state: SessionState {
                is_authenticated: self.is_authenticated,
                access_token: self.access_token.clone(),
                refresh_token: self.refresh_token.clone(),
                user: self.user.clone(),
                access_token_expiration: self.access_token_expiration,
            },
            version: PERSIST_VERSION,
        }
    }

    /// Build a session from a persisted state
    pub fn from_state(state: SessionState, has_hydrated: bool) -> Self {
        Session {
            is_authenticated: state.is_authenticated && state.access_token.is_some(),
            access_token: state.access_token,
            refresh_token: state.refresh_token,
            user: state.user,
            access_token_expiration: state.access_token_expiration,
            has_hydrated,
        }
    }
}

/// Partial session update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
    pub access_token_expiration: Option<i64>,
    pub is_authenticated: Option<bool>,
}

impl From<SessionState> for SessionUpdate {
    fn from(state: SessionState) -> Self {
        SessionUpdate {
            access_token: state.access_token,
            refresh_token: state.refresh_token,
            user: state.user,
            access_token_expiration: state.access_token_expiration,
            is_authenticated: Some(state.is_authenticated),
        }
    }
}

/// Session fields as written to the backing store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub access_token_expiration: Option<i64>,
}

/// Persisted record envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub state: SessionState,
    #[serde(default)]
    pub version: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticated(expiration: Option<i64>) -> Session {
        Session {
            is_authenticated: true,
            access_token: Some("T".to_string()),
            refresh_token: Some("R".to_string()),
            user: Some(User::with_id(1)),
            access_token_expiration: expiration,
            has_hydrated: true,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let session = authenticated(Some(1_000));
        assert!(session.is_valid_at(999));
        assert!(!session.is_valid_at(1_000));
        assert!(session.is_expired_at(1_001));

        // No expiry recorded means never expired
        assert!(authenticated(None).is_valid_at(i64::MAX));
    }

    #[test]
    fn test_apply_infers_authentication_from_token() {
        let mut session = Session::default();
        session.apply(SessionUpdate {
            access_token: Some("T".to_string()),
            ..Default::default()
        });
        assert!(session.is_authenticated);
        assert_eq!(session.access_token.as_deref(), Some("T"));
    }

    #[test]
    fn test_apply_does_not_downgrade_by_omission() {
        let mut session = authenticated(None);
        session.apply(SessionUpdate {
            user: Some(User::with_id(9)),
            ..Default::default()
        });
        assert!(session.is_authenticated);
        assert_eq!(session.user.as_ref().map(|u| u.id), Some(9));
        assert_eq!(session.refresh_token.as_deref(), Some("R"));
    }

    #[test]
    fn test_apply_explicit_flag_wins() {
        let mut session = authenticated(None);
        session.apply(SessionUpdate {
            access_token: Some("T2".to_string()),
            is_authenticated: Some(false),
            ..Default::default()
        });
        assert!(!session.is_authenticated);
        assert_eq!(session.access_token.as_deref(), Some("T2"));
    }

    #[test]
    fn test_apply_never_authenticates_without_token() {
        let mut session = Session::default();
        session.apply(SessionUpdate {
            is_authenticated: Some(true),
            ..Default::default()
        });
        assert!(!session.is_authenticated);
        assert!(session.access_token.is_none());
    }

    #[test]
    fn test_reset_keeps_hydration_flag() {
        let mut session = authenticated(Some(5));
        session.reset();
        assert_eq!(
            session,
            Session {
                has_hydrated: true,
                ..Session::default()
            }
        );
    }

    #[test]
    fn test_expire_keeps_refresh_material() {
        let mut session = authenticated(Some(5));
        session.expire();

        assert!(!session.is_authenticated);
        assert_eq!(session.access_token, None);
        assert_eq!(session.access_token_expiration, None);
        assert_eq!(session.refresh_token.as_deref(), Some("R"));
        assert_eq!(session.user.as_ref().map(|u| u.id), Some(1));
        assert!(session.has_hydrated);
        assert!(session.has_credentials());
    }

    #[test]
    fn test_has_credentials() {
        assert!(!Session::default().has_credentials());

        let lone_refresh = Session {
            refresh_token: Some("R".to_string()),
            ..Session::default()
        };
        assert!(lone_refresh.has_credentials());
    }

    #[test]
    fn test_persisted_layout() {
        let record = serde_json::to_value(authenticated(Some(42)).to_persisted()).unwrap();
        assert_eq!(record["version"], 0);
        assert_eq!(record["state"]["isAuthenticated"], true);
        assert_eq!(record["state"]["accessToken"], "T");
        assert_eq!(record["state"]["refreshToken"], "R");
        assert_eq!(record["state"]["accessTokenExpiration"], 42);
        assert_eq!(record["state"]["user"]["id"], 1);
    }

    #[test]
    fn test_persisted_round_trip_is_identical() {
        let session = authenticated(Some(1_700_000_000_000));
        let raw = serde_json::to_string(&session.to_persisted()).unwrap();
        let decoded: PersistedSession = serde_json::from_str(&raw).unwrap();
        assert_eq!(Session::from_state(decoded.state, true), session);
    }

    #[test]
    fn test_partial_record_decodes() {
        let decoded: PersistedSession =
            serde_json::from_str(r#"{"state":{"accessToken":"T"}}"#).unwrap();
        assert!(!decoded.state.is_authenticated);
        assert_eq!(decoded.state.access_token.as_deref(), Some("T"));
        assert_eq!(decoded.version, 0);
    }
}
