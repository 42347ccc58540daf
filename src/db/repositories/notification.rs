//! Notification repository
//!
//! Announcements plus the per-intern record of which ones were dismissed.

use crate::config::DatabaseDriver;
use crate::db::{DynDatabasePool, InsertedId};
use crate::models::Notification;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

const NOTIFICATION_COLUMNS: &str = "id, subject, kind, message, created_at";

/// Notification repository trait
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<Notification>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Notification>>;

    /// All notifications, newest first
    async fn list(&self) -> Result<Vec<Notification>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Record a dismissal. Dismissing twice is not an error.
    async fn dismiss(&self, intern_id: i64, notification_id: i64) -> Result<()>;

    /// Ids of notifications an intern has dismissed
    async fn dismissed_ids(&self, intern_id: i64) -> Result<Vec<i64>>;
}

/// SQLx-based notification repository, SQLite and MySQL
pub struct SqlxNotificationRepository {
    pool: DynDatabasePool,
}

impl SqlxNotificationRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NotificationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<Notification> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                "INSERT INTO notifications (subject, kind, message, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&notification.subject)
            .bind(notification.kind.as_str())
            .bind(&notification.message)
            .bind(notification.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create notification")?;

        Ok(Notification {
            id,
            ..notification.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Notification>> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE id = ?",
            NOTIFICATION_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Notification>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
        })
        .context("Failed to get notification by ID")
    }

    async fn list(&self) -> Result<Vec<Notification>> {
        let sql = format!(
            "SELECT {} FROM notifications ORDER BY created_at DESC, id DESC",
            NOTIFICATION_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Notification>(&sql).fetch_all(p).await
        })
        .context("Failed to list notifications")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM notifications WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to delete notification")
    }

    async fn dismiss(&self, intern_id: i64, notification_id: i64) -> Result<()> {
        let sql = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                "INSERT OR IGNORE INTO notification_dismissals (intern_id, notification_id, dismissed_at) VALUES (?, ?, ?)"
            }
            DatabaseDriver::Mysql => {
                "INSERT IGNORE INTO notification_dismissals (intern_id, notification_id, dismissed_at) VALUES (?, ?, ?)"
            }
        };
        let now = Utc::now();
        with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(intern_id)
                .bind(notification_id)
                .bind(now)
                .execute(p)
                .await
                .map(|_| ())
        })
        .context("Failed to dismiss notification")
    }

    async fn dismissed_ids(&self, intern_id: i64) -> Result<Vec<i64>> {
        with_pool!(self.pool, |p| {
            sqlx::query("SELECT notification_id FROM notification_dismissals WHERE intern_id = ?")
                .bind(intern_id)
                .fetch_all(p)
                .await
                .map(|rows| {
                    rows.iter()
                        .map(|row| row.get::<i64, _>("notification_id"))
                        .collect::<Vec<_>>()
                })
        })
        .context("Failed to list dismissed notifications")
    }
}
