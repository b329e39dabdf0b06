//! # State Repository Module
//!
//! Narrow storage interface for per-user sessions, with an in-memory
//! implementation and a PostgreSQL one that survives restarts.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::dialogue::{Session, UserKey};

/// Storage for per-user sessions
#[async_trait]
pub trait StateRepository: Send + Sync {
    async fn get(&self, user: UserKey) -> Result<Option<Session>>;
    async fn set(&self, user: UserKey, session: &Session) -> Result<()>;
    async fn delete(&self, user: UserKey) -> Result<()>;
}

/// Sessions kept in process memory; lost on restart
#[derive(Debug, Default)]
pub struct InMemoryStateRepository {
    sessions: Mutex<HashMap<UserKey, Session>>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn get(&self, user: UserKey) -> Result<Option<Session>> {
        Ok(self.sessions.lock().await.get(&user).cloned())
    }

    async fn set(&self, user: UserKey, session: &Session) -> Result<()> {
        self.sessions.lock().await.insert(user, session.clone());
        Ok(())
    }

    async fn delete(&self, user: UserKey) -> Result<()> {
        self.sessions.lock().await.remove(&user);
        Ok(())
    }
}

/// Sessions stored as JSON rows in PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresStateRepository {
    pool: PgPool,
}

impl PostgresStateRepository {
    /// Connect and make sure the sessions table exists
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to session database")?;
        let repository = Self { pool };
        repository.init_schema().await?;
        Ok(repository)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing session store schema");

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS upload_sessions (
                user_key BIGINT PRIMARY KEY,
                session TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create upload_sessions table")?;

        Ok(())
    }
}

#[async_trait]
impl StateRepository for PostgresStateRepository {
    async fn get(&self, user: UserKey) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT session FROM upload_sessions WHERE user_key = $1")
            .bind(user as i64)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load session")?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("session")?;
                let session = serde_json::from_str(&raw).context("Corrupted session row")?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, user: UserKey, session: &Session) -> Result<()> {
        let raw = serde_json::to_string(session)?;
        sqlx::query(
            "INSERT INTO upload_sessions (user_key, session, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (user_key) DO UPDATE SET session = EXCLUDED.session, updated_at = NOW()",
        )
        .bind(user as i64)
        .bind(raw)
        .execute(&self.pool)
        .await
        .context("Failed to store session")?;

        debug!(user_id = user, "Session stored");
        Ok(())
    }

    async fn delete(&self, user: UserKey) -> Result<()> {
        sqlx::query("DELETE FROM upload_sessions WHERE user_key = $1")
            .bind(user as i64)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }
}
