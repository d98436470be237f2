// Session backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// Enum dispatch also lets `update` stay generic over its closure, which a
// trait object could not offer.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::memory::InMemorySessionStore;
use super::postgres::PgSessionStore;
use crate::session::Session;

/// Session backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum SessionBackend {
    /// In-memory map (dev mode, tests, single instance)
    InMemory(Arc<InMemorySessionStore>),
    /// PostgreSQL table (shared by several gateway instances)
    Postgres(PgSessionStore),
}

impl SessionBackend {
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemorySessionStore::new()))
    }

    pub async fn postgres(database_url: &str) -> Result<Self> {
        Ok(Self::Postgres(PgSessionStore::connect(database_url).await?))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InMemory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    pub async fn insert(&self, session: &Session) -> Result<()> {
        match self {
            Self::InMemory(db) => db.insert(session).await,
            Self::Postgres(db) => db.insert(session).await,
        }
    }

    pub async fn get(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        match self {
            Self::InMemory(db) => db.get(id, now).await,
            Self::Postgres(db) => db.get(id, now).await,
        }
    }

    pub async fn update<F, R>(&self, id: &str, now: DateTime<Utc>, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut Session) -> R + Send,
        R: Send,
    {
        match self {
            Self::InMemory(db) => db.update(id, now, f).await,
            Self::Postgres(db) => db.update(id, now, f).await,
        }
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        match self {
            Self::InMemory(db) => db.remove(id).await,
            Self::Postgres(db) => db.remove(id).await,
        }
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        match self {
            Self::InMemory(db) => db.purge_expired(now).await,
            Self::Postgres(db) => db.purge_expired(now).await,
        }
    }
}
