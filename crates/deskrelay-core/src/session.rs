// Server-side sessions
// Decision: Logged-in state is derived from the presence of a user, so the two can't disagree
// Decision: Expiry is fixed from creation by default; sliding expiry is opt-in
// Decision: Every mutation goes through SessionStore::update, which applies the closure under one lock
//
// Sessions are created lazily by the first request that needs session state
// (a login attempt). Requests that only read identity never create one.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::storage::SessionBackend;
use crate::throttle::LoginThrottleState;

const SESSION_ID_BYTES: usize = 32; // 32 random bytes = 64 hex chars

/// Default session lifetime: 24 hours
pub const DEFAULT_SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Identity attached to a logged-in session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub throttle: LoginThrottleState,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id,
            user: None,
            throttle: LoginThrottleState::default(),
            created_at: now,
            expires_at: expiry_after(now, ttl),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn log_in(&mut self, user: SessionUser) {
        self.user = Some(user);
    }
}

/// `now + ttl`, saturating at the latest representable instant
pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Generate an unguessable session identifier
pub fn generate_session_id() -> String {
    let bytes: [u8; SESSION_ID_BYTES] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// How activity affects a session's expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionExpiry {
    /// Expires a fixed time after creation
    #[default]
    Fixed,
    /// Each authenticated request pushes expiry out by the full TTL
    Sliding,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub ttl: Duration,
    pub expiry: SessionExpiry,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::milliseconds(DEFAULT_SESSION_TTL_MS),
            expiry: SessionExpiry::Fixed,
        }
    }
}

/// Session store: lifecycle operations over a pluggable backend
#[derive(Clone)]
pub struct SessionStore {
    backend: SessionBackend,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(backend: SessionBackend, config: SessionConfig) -> Self {
        Self { backend, config }
    }

    /// Store backed by process memory
    pub fn in_memory(config: SessionConfig) -> Self {
        Self::new(SessionBackend::in_memory(), config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Return the session named by the cookie, or create a new one.
    /// The flag is true when a new session was created and the cookie must be set.
    pub async fn get_or_create(&self, cookie_id: Option<&str>) -> Result<(Session, bool)> {
        if let Some(id) = cookie_id {
            if let Some(session) = self.load(id).await? {
                return Ok((session, false));
            }
        }

        let session = Session::new(generate_session_id(), Utc::now(), self.config.ttl);
        self.backend.insert(&session).await?;
        tracing::debug!(expires_at = %session.expires_at, "Created session");

        Ok((session, true))
    }

    /// Look up a live session. Expired sessions read as missing.
    pub async fn load(&self, id: &str) -> Result<Option<Session>> {
        self.backend.get(id, Utc::now()).await
    }

    /// Record activity. Returns true when expiry moved and the cookie should be re-issued.
    pub async fn touch(&self, id: &str) -> Result<bool> {
        match self.config.expiry {
            SessionExpiry::Fixed => Ok(false),
            SessionExpiry::Sliding => {
                let ttl = self.config.ttl;
                let touched = self
                    .update(id, |session| session.expires_at = expiry_after(Utc::now(), ttl))
                    .await?;
                Ok(touched.is_some())
            }
        }
    }

    /// Apply `f` to a live session atomically. `None` if it is missing or expired.
    pub async fn update<F, R>(&self, id: &str, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut Session) -> R + Send,
        R: Send,
    {
        self.backend.update(id, Utc::now(), f).await
    }

    /// Move a live session to a fresh id, applying `f` to the new session first.
    /// Throttle state and identity carry over; the old id stops resolving.
    pub async fn rotate<F>(&self, id: &str, f: F) -> Result<Option<Session>>
    where
        F: FnOnce(&mut Session),
    {
        let Some(mut session) = self.load(id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        session.id = generate_session_id();
        session.created_at = now;
        session.expires_at = expiry_after(now, self.config.ttl);
        f(&mut session);

        self.backend.insert(&session).await?;
        self.backend.remove(id).await?;
        tracing::debug!("Rotated session id");

        Ok(Some(session))
    }

    /// Invalidate a session immediately
    pub async fn destroy(&self, id: &str) -> Result<()> {
        self.backend.remove(id).await
    }

    /// Drop every expired session; returns how many were removed
    pub async fn purge_expired(&self) -> Result<u64> {
        self.backend.purge_expired(Utc::now()).await
    }
}
