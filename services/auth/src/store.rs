//! Session store
//!
//! Holds the single client session, mediates every read and write of the
//! persisted record, and exposes the operations the UI layer drives: login,
//! logout, startup hydration and validation, partial updates and token
//! refresh.
//!
//! The backing store is authoritative at startup and memory is a cache of it.
//! Every mutation is written through before the operation returns, and a
//! failed write leaves memory untouched. Expiry is the one exception: an
//! expired token is dropped from memory even if the write fails. Network calls run without holding the
//! session lock; each operation commits under the lock at its end.

use std::sync::Arc;

use common::{
    KeyValueStore, StorageError,
    storage::{get_json, set_json},
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    api::AuthApi,
    config::AuthConfig,
    error::{AuthError, AuthResult},
    models::{
        PersistedSession, STORE_KEY, Session, SessionUpdate, TokenGrant, User, now_millis,
    },
    validation::validate_credentials,
};

/// Session store
pub struct SessionStore {
    api: AuthApi,
    storage: Arc<dyn KeyValueStore>,
    token_ttl_secs: u64,
    session: Mutex<Session>,
}

impl SessionStore {
    /// Create a new session store with an empty, not yet hydrated session
    pub fn new(api: AuthApi, storage: Arc<dyn KeyValueStore>, config: &AuthConfig) -> Self {
        Self {
            api,
            storage,
            token_ttl_secs: config.token_ttl_secs,
            session: Mutex::new(Session::default()),
        }
    }

    /// Create a new session store, building the API client from configuration
    pub fn from_config(config: &AuthConfig, storage: Arc<dyn KeyValueStore>) -> AuthResult<Self> {
        let api = AuthApi::new(config)?;
        Ok(Self::new(api, storage, config))
    }

    /// Load the persisted record into memory
    ///
    /// Returns whether a record was found. The hydration flag is set even when
    /// loading fails; an undecodable record is treated as absent.
    pub async fn hydrate(&self) -> AuthResult<bool> {
        let loaded = get_json::<PersistedSession>(self.storage.as_ref(), STORE_KEY).await;
        let mut session = self.session.lock().await;

        match loaded {
            Ok(Some(record)) => {
                *session = Session::from_state(record.state, true);
                info!("Session hydrated from storage");
                Ok(true)
            }
            Ok(None) => {
                session.has_hydrated = true;
                debug!("No persisted session found");
                Ok(false)
            }
            Err(StorageError::Serialization(e)) => {
                session.has_hydrated = true;
                warn!("Ignoring unreadable persisted session: {}", e);
                Ok(false)
            }
            Err(e) => {
                session.has_hydrated = true;
                error!("Failed to hydrate session: {}", e);
                Err(e.into())
            }
        }
    }

    /// Validate the persisted record at startup
    ///
    /// Reads the raw record rather than the in-memory mirror. On success the
    /// memory is reconciled with the record as a confirmed-valid session. Never
    /// contacts the network.
    pub async fn check_auth(&self) -> bool {
        let raw = match self.storage.get(STORE_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Error checking auth: {}", e);
                return false;
            }
        };

        let Some(raw) = raw else {
            debug!("No persisted session to check");
            self.clear_session().await;
            return false;
        };

        let record: PersistedSession = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("Persisted session is unreadable: {}", e);
                return false;
            }
        };

        let state = record.state;
        if !state.is_authenticated || state.access_token.is_none() {
            debug!("Persisted session is not authenticated");
            return false;
        }

        if matches!(state.access_token_expiration, Some(expiration) if now_millis() >= expiration)
        {
            info!("Persisted session has expired");
            let mut session = self.session.lock().await;
            let expired = Session::from_state(state, session.has_hydrated);
            self.expire(&mut session, expired).await;
            return false;
        }

        let update = SessionUpdate {
            is_authenticated: Some(true),
            ..SessionUpdate::from(state)
        };

        match self.update_auth_data(update).await {
            Ok(_) => {
                info!("Valid authentication found in storage");
                true
            }
            Err(e) => {
                error!("Failed to reconcile session: {}", e);
                false
            }
        }
    }

    /// Log in with an identifier (email or username) and secret
    ///
    /// Blank inputs are rejected before any network call. On failure the
    /// session is left unchanged.
    pub async fn login(&self, identifier: &str, secret: &str) -> AuthResult<Session> {
        validate_credentials(identifier, secret)?;

        let grant = self.api.login(identifier.trim(), secret).await?;
        let expiration = grant.expiration_from(now_millis(), self.token_ttl_secs);
        let TokenGrant {
            access_token,
            refresh_token,
            user,
            ..
        } = grant;

        let mut session = self.session.lock().await;
        let next = Session {
            is_authenticated: true,
            access_token: Some(access_token),
            refresh_token,
            user,
            access_token_expiration: Some(expiration),
            has_hydrated: session.has_hydrated,
        };

        self.commit(&mut session, next).await?;
        info!("Auth state updated successfully");
        Ok(session.clone())
    }

    /// Log out locally, telling the server on a best-effort basis
    ///
    /// Remote and storage failures are logged and swallowed; the session always
    /// ends up empty.
    pub async fn logout(&self) {
        let access_token = self.session.lock().await.access_token.clone();

        match access_token {
            Some(token) => {
                if let Err(e) = self.api.logout(&token).await {
                    warn!("Logout API call failed: {}", e);
                }
            }
            None => debug!("No access token, skipping logout API call"),
        }

        self.clear_session().await;
        info!("Local logout completed");
    }

    /// Merge a partial update into the session and persist it
    ///
    /// Supplying an access token without an explicit `is_authenticated` marks
    /// the session authenticated; omitting both keeps the current flag.
    pub async fn update_auth_data(&self, update: SessionUpdate) -> AuthResult<Session> {
        let mut session = self.session.lock().await;
        let mut next = session.clone();
        next.apply(update);

        self.commit(&mut session, next).await?;
        Ok(session.clone())
    }

    /// Exchange the refresh token (or session cookie) for a new access token
    ///
    /// The user and refresh token are kept unless the server supplies new
    /// ones. On failure the session is left unchanged and the caller decides
    /// whether to log out.
    pub async fn refresh_access_token(&self) -> AuthResult<Session> {
        let refresh_token = {
            let session = self.session.lock().await;
            if !session.has_credentials() {
                return Err(AuthError::NoSession);
            }
            session.refresh_token.clone()
        };

        let grant = match self.api.refresh(refresh_token.as_deref()).await {
            Ok(grant) => grant,
            Err(e) => {
                error!("Error refreshing token: {}", e);
                return Err(e);
            }
        };
        let expiration = grant.expiration_from(now_millis(), self.token_ttl_secs);

        let update = SessionUpdate {
            access_token: Some(grant.access_token),
            refresh_token: grant.refresh_token,
            user: grant.user,
            access_token_expiration: Some(expiration),
            is_authenticated: Some(true),
        };

        let session = self.update_auth_data(update).await?;
        info!("Token refreshed successfully");
        Ok(session)
    }

    /// Current session, downgraded to anonymous first if its token expired
    ///
    /// The downgrade keeps the refresh token and profile so a later
    /// `refresh_access_token` can renew the session.
    pub async fn session(&self) -> Session {
        let mut session = self.session.lock().await;

        if session.access_token.is_some() && session.is_expired_at(now_millis()) {
            info!("Access token expired, downgrading session");
            let current = session.clone();
            self.expire(&mut session, current).await;
        }

        session.clone()
    }

    /// Whether a non-expired access token is held
    pub async fn is_authenticated(&self) -> bool {
        self.session().await.is_authenticated
    }

    /// Profile of the signed-in user
    pub async fn user(&self) -> Option<User> {
        self.session().await.user
    }

    /// Access token for authorizing API requests
    pub async fn access_token(&self) -> Option<String> {
        self.session().await.access_token
    }

    /// Whether hydration has been attempted
    pub async fn has_hydrated(&self) -> bool {
        self.session.lock().await.has_hydrated
    }

    async fn commit(&self, session: &mut Session, next: Session) -> AuthResult<()> {
        set_json(self.storage.as_ref(), STORE_KEY, &next.to_persisted()).await?;
        *session = next;
        Ok(())
    }

    /// Replace the session with the expired form of `next`
    ///
    /// The expired state is always taken in memory; a failed write is logged.
    async fn expire(&self, session: &mut Session, mut next: Session) {
        next.expire();
        if let Err(e) = set_json(self.storage.as_ref(), STORE_KEY, &next.to_persisted()).await {
            warn!("Failed to persist expired session: {}", e);
        }
        *session = next;
    }

    async fn clear_session(&self) {
        let mut session = self.session.lock().await;
        self.clear(&mut session).await;
    }

    /// Reset the session and remove the persisted record, logging storage
    /// failures
    async fn clear(&self, session: &mut Session) {
        session.reset();
        if let Err(e) = self.storage.remove(STORE_KEY).await {
            warn!("Failed to clear persisted session: {}", e);
        }
    }
}
