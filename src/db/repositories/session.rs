//! Session repository
//!
//! Login sessions for admins and interns, keyed by an opaque token.

use crate::db::DynDatabasePool;
use crate::models::{Participant, Session};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions of one admin or intern
    async fn delete_by_principal(&self, principal: Participant) -> Result<()>;

    /// Delete expired sessions
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based session repository, SQLite and MySQL
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        let principal = session.principal.to_string();
        with_pool!(self.pool, |p| {
            sqlx::query(
                r#"
                INSERT INTO sessions (id, principal, expires_at, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&session.id)
            .bind(&principal)
            .bind(session.expires_at)
            .bind(session.created_at)
            .execute(p)
            .await
            .map(|_| ())
        })
        .context("Failed to create session")?;

        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Session>(
                "SELECT id, principal, expires_at, created_at FROM sessions WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(p)
            .await
        })
        .context("Failed to get session by ID")
    }

    async fn delete(&self, id: &str) -> Result<()> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|_| ())
        })
        .context("Failed to delete session")?;
        Ok(())
    }

    async fn delete_by_principal(&self, principal: Participant) -> Result<()> {
        let principal = principal.to_string();
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM sessions WHERE principal = ?")
                .bind(&principal)
                .execute(p)
                .await
                .map(|_| ())
        })
        .context("Failed to delete sessions by principal")?;
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let now = Utc::now();
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
                .bind(now)
                .execute(p)
                .await
                .map(|r| r.rows_affected())
        })
        .context("Failed to delete expired sessions")
    }
}
