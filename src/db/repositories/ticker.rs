//! Ticker settings repository

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::TickerSetting;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

const TICKER_COLUMNS: &str = "id, value, position, created_at";

#[async_trait]
pub trait TickerRepository: Send + Sync {
    async fn create(&self, setting: &TickerSetting) -> Result<TickerSetting>;

    /// Settings in display order
    async fn list(&self) -> Result<Vec<TickerSetting>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Position one past the current last item
    async fn next_position(&self) -> Result<i32>;
}

pub struct SqlxTickerRepository {
    pool: DynDatabasePool,
}

impl SqlxTickerRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TickerRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TickerRepository for SqlxTickerRepository {
    async fn create(&self, setting: &TickerSetting) -> Result<TickerSetting> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query("INSERT INTO ticker_settings (value, position, created_at) VALUES (?, ?, ?)")
                .bind(&setting.value)
                .bind(setting.position)
                .bind(setting.created_at)
                .execute(p)
                .await
                .map(|r| r.inserted_id())
        })
        .context("Failed to create ticker setting")?;

        Ok(TickerSetting {
            id,
            ..setting.clone()
        })
    }

    async fn list(&self) -> Result<Vec<TickerSetting>> {
        let sql = format!(
            "SELECT {} FROM ticker_settings ORDER BY position ASC, id ASC",
            TICKER_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, TickerSetting>(&sql).fetch_all(p).await
        })
        .context("Failed to list ticker settings")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM ticker_settings WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to delete ticker setting")
    }

    async fn next_position(&self) -> Result<i32> {
        with_pool!(self.pool, |p| {
            sqlx::query("SELECT COALESCE(MAX(position), -1) + 1 AS next FROM ticker_settings")
                .fetch_one(p)
                .await
                .map(|row| row.try_get::<i64, _>("next").unwrap_or(0) as i32)
        })
        .context("Failed to compute next ticker position")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Utc;

    async fn setup_test_repo() -> SqlxTickerRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxTickerRepository::new(pool)
    }

    async fn push(repo: &SqlxTickerRepository, value: &str) -> TickerSetting {
        let position = repo.next_position().await.unwrap();
        repo.create(&TickerSetting {
            id: 0,
            value: value.to_string(),
            position,
            created_at: Utc::now(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_positions_append() {
        let repo = setup_test_repo().await;
        assert_eq!(repo.next_position().await.unwrap(), 0);

        let first = push(&repo, "Registrations open").await;
        push(&repo, "Results announced").await;
        assert_eq!(first.position, 0);
        assert_eq!(repo.next_position().await.unwrap(), 2);

        assert!(repo.delete(first.id).await.unwrap());
        let values: Vec<String> = repo.list().await.unwrap().into_iter().map(|s| s.value).collect();
        assert_eq!(values, vec!["Results announced"]);
    }
}
