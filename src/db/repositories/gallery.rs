//! Gallery repository

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::GalleryEntry;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

const GALLERY_COLUMNS: &str = "id, title, url, uploader, date, created_at";

/// Gallery repository trait
#[async_trait]
pub trait GalleryRepository: Send + Sync {
    async fn create(&self, entry: &GalleryEntry) -> Result<GalleryEntry>;

    async fn get_by_id(&self, id: i64) -> Result<Option<GalleryEntry>>;

    async fn list(&self) -> Result<Vec<GalleryEntry>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based gallery repository, SQLite and MySQL
pub struct SqlxGalleryRepository {
    pool: DynDatabasePool,
}

impl SqlxGalleryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn GalleryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl GalleryRepository for SqlxGalleryRepository {
    async fn create(&self, entry: &GalleryEntry) -> Result<GalleryEntry> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                "INSERT INTO gallery (title, url, uploader, date, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&entry.title)
            .bind(&entry.url)
            .bind(&entry.uploader)
            .bind(entry.date)
            .bind(entry.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create gallery entry")?;

        Ok(GalleryEntry {
            id,
            ..entry.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<GalleryEntry>> {
        let sql = format!("SELECT {} FROM gallery WHERE id = ?", GALLERY_COLUMNS);
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, GalleryEntry>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
        })
        .context("Failed to get gallery entry by ID")
    }

    async fn list(&self) -> Result<Vec<GalleryEntry>> {
        let sql = format!(
            "SELECT {} FROM gallery ORDER BY created_at DESC, id DESC",
            GALLERY_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, GalleryEntry>(&sql).fetch_all(p).await
        })
        .context("Failed to list gallery")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM gallery WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to delete gallery entry")
    }
}
