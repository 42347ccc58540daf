//! Contact inbox repository

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::{ContactMessage, ContactStatus};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

const CONTACT_COLUMNS: &str = "id, student_id, email, message, status, resolved_by, created_at";

/// Contact message repository trait
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage>;

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactMessage>>;

    /// All messages, newest first
    async fn list(&self) -> Result<Vec<ContactMessage>>;

    /// Mark a message resolved, recording who answered it
    async fn resolve(&self, id: i64, resolved_by: &str) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count_by_status(&self, status: ContactStatus) -> Result<i64>;
}

/// SQLx-based contact repository, SQLite and MySQL
pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                r#"
                INSERT INTO contact_messages (student_id, email, message, status, resolved_by, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&message.student_id)
            .bind(&message.email)
            .bind(&message.message)
            .bind(message.status.as_str())
            .bind(&message.resolved_by)
            .bind(message.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create contact message")?;

        Ok(ContactMessage {
            id,
            ..message.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactMessage>> {
        let sql = format!("SELECT {} FROM contact_messages WHERE id = ?", CONTACT_COLUMNS);
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, ContactMessage>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
        })
        .context("Failed to get contact message by ID")
    }

    async fn list(&self) -> Result<Vec<ContactMessage>> {
        let sql = format!(
            "SELECT {} FROM contact_messages ORDER BY created_at DESC, id DESC",
            CONTACT_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, ContactMessage>(&sql).fetch_all(p).await
        })
        .context("Failed to list contact messages")
    }

    async fn resolve(&self, id: i64, resolved_by: &str) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("UPDATE contact_messages SET status = ?, resolved_by = ? WHERE id = ?")
                .bind(ContactStatus::Resolved.as_str())
                .bind(resolved_by)
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to resolve contact message")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM contact_messages WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to delete contact message")
    }

    async fn count_by_status(&self, status: ContactStatus) -> Result<i64> {
        with_pool!(self.pool, |p| {
            sqlx::query("SELECT COUNT(*) AS n FROM contact_messages WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(p)
                .await
                .map(|row| row.get::<i64, _>("n"))
        })
        .context("Failed to count contact messages")
    }
}
