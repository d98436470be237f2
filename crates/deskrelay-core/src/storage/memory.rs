// In-memory session storage for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: A single write lock covers each read-modify-write so session updates are never torn

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::session::Session;

/// In-memory session map. All data is lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub async fn insert(&self, session: &Session) -> Result<()> {
        self.sessions
            .write()
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    pub async fn get(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        {
            let sessions = self.sessions.read();
            match sessions.get(id) {
                None => return Ok(None),
                Some(session) if !session.is_expired(now) => return Ok(Some(session.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it so later lookups stay cheap
        self.sessions.write().remove(id);
        Ok(None)
    }

    pub async fn update<F, R>(&self, id: &str, now: DateTime<Utc>, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.write();
        match sessions.get_mut(id) {
            None => return Ok(None),
            Some(session) if !session.is_expired(now) => return Ok(Some(f(session))),
            Some(_) => {}
        }
        sessions.remove(id);
        Ok(None)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.sessions.write().remove(id);
        Ok(())
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}
