//! MoU repository

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::Mou;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

const MOU_COLUMNS: &str = "id, partner, scope, date, duration, status, description, logo_url, photo_url, doc_url, created_at";

#[async_trait]
pub trait MouRepository: Send + Sync {
    async fn create(&self, mou: &Mou) -> Result<Mou>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Mou>>;

    /// All agreements, newest signing date first
    async fn list(&self) -> Result<Vec<Mou>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxMouRepository {
    pool: DynDatabasePool,
}

impl SqlxMouRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MouRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MouRepository for SqlxMouRepository {
    async fn create(&self, mou: &Mou) -> Result<Mou> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                r#"
                INSERT INTO mous (partner, scope, date, duration, status, description, logo_url, photo_url, doc_url, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&mou.partner)
            .bind(&mou.scope)
            .bind(mou.date)
            .bind(&mou.duration)
            .bind(&mou.status)
            .bind(&mou.description)
            .bind(&mou.logo_url)
            .bind(&mou.photo_url)
            .bind(&mou.doc_url)
            .bind(mou.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create MoU")?;

        Ok(Mou { id, ..mou.clone() })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Mou>> {
        let sql = format!("SELECT {} FROM mous WHERE id = ?", MOU_COLUMNS);
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Mou>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
        })
        .context("Failed to get MoU by ID")
    }

    async fn list(&self) -> Result<Vec<Mou>> {
        // NULL dates sort last on both backends
        let sql = format!(
            "SELECT {} FROM mous ORDER BY CASE WHEN date IS NULL THEN 1 ELSE 0 END, date DESC, id DESC",
            MOU_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Mou>(&sql).fetch_all(p).await
        })
        .context("Failed to list MoUs")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM mous WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to delete MoU")
    }
}
