//! Document repository
//!
//! A document with no `assigned_to` is addressed to every intern.

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::Document;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

const DOCUMENT_COLUMNS: &str = "id, title, assigned_to, assigned_name, file_url, size, created_at";

/// Document repository trait
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: &Document) -> Result<Document>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Document>>;

    /// All documents, newest first
    async fn list(&self) -> Result<Vec<Document>>;

    /// Documents assigned to the intern plus those addressed to everyone
    async fn list_for_intern(&self, intern_id: i64) -> Result<Vec<Document>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based document repository, SQLite and MySQL
pub struct SqlxDocumentRepository {
    pool: DynDatabasePool,
}

impl SqlxDocumentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn DocumentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl DocumentRepository for SqlxDocumentRepository {
    async fn create(&self, document: &Document) -> Result<Document> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                r#"
                INSERT INTO documents (title, assigned_to, assigned_name, file_url, size, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&document.title)
            .bind(document.assigned_to)
            .bind(&document.assigned_name)
            .bind(&document.file_url)
            .bind(&document.size)
            .bind(document.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create document")?;

        Ok(Document {
            id,
            ..document.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Document>> {
        let sql = format!("SELECT {} FROM documents WHERE id = ?", DOCUMENT_COLUMNS);
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Document>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
        })
        .context("Failed to get document by ID")
    }

    async fn list(&self) -> Result<Vec<Document>> {
        let sql = format!(
            "SELECT {} FROM documents ORDER BY created_at DESC, id DESC",
            DOCUMENT_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Document>(&sql).fetch_all(p).await
        })
        .context("Failed to list documents")
    }

    async fn list_for_intern(&self, intern_id: i64) -> Result<Vec<Document>> {
        let sql = format!(
            "SELECT {} FROM documents WHERE assigned_to = ? OR assigned_to IS NULL ORDER BY created_at DESC, id DESC",
            DOCUMENT_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Document>(&sql)
                .bind(intern_id)
                .fetch_all(p)
                .await
        })
        .context("Failed to list documents for intern")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM documents WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to delete document")
    }
}
