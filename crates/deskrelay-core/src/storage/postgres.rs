// PostgreSQL session storage
// Decision: Store the session as JSONB next to an indexed expires_at column
// Decision: Updates run in a transaction holding a row lock (SELECT ... FOR UPDATE)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::session::Session;

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply the embedded migrations
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to session database")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run session migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, data, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&session.id)
        .bind(Json(session))
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        let row: Option<(Json<Session>,)> = sqlx::query_as(
            r#"
            SELECT data
            FROM sessions
            WHERE id = $1 AND expires_at > $2
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(Json(session),)| session))
    }

    pub async fn update<F, R>(&self, id: &str, now: DateTime<Utc>, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut Session) -> R + Send,
        R: Send,
    {
        let mut tx = self.pool.begin().await?;

        let row: Option<(Json<Session>,)> = sqlx::query_as(
            r#"
            SELECT data
            FROM sessions
            WHERE id = $1 AND expires_at > $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((Json(mut session),)) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let output = f(&mut session);

        sqlx::query(
            r#"
            UPDATE sessions
            SET data = $2, expires_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(&session))
        .bind(session.expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(output))
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
