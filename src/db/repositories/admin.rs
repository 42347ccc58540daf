//! Admin repository

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::Admin;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

const ADMIN_COLUMNS: &str = "id, name, email, password_hash, created_at";

/// Admin repository trait
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Insert an admin; the returned copy carries the new id
    async fn create(&self, admin: &Admin) -> Result<Admin>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>>;

    /// Lookup by login email (case-insensitive)
    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>>;

    async fn list(&self) -> Result<Vec<Admin>>;

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx-based admin repository, SQLite and MySQL
pub struct SqlxAdminRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AdminRepository for SqlxAdminRepository {
    async fn create(&self, admin: &Admin) -> Result<Admin> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                "INSERT INTO admins (name, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&admin.name)
            .bind(&admin.email)
            .bind(&admin.password_hash)
            .bind(admin.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create admin")?;

        Ok(Admin {
            id,
            ..admin.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>> {
        let sql = format!("SELECT {} FROM admins WHERE id = ?", ADMIN_COLUMNS);
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Admin>(&sql).bind(id).fetch_optional(p).await
        })
        .context("Failed to get admin by ID")
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let sql = format!(
            "SELECT {} FROM admins WHERE LOWER(email) = LOWER(?)",
            ADMIN_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Admin>(&sql)
                .bind(email.trim())
                .fetch_optional(p)
                .await
        })
        .context("Failed to get admin by email")
    }

    async fn list(&self) -> Result<Vec<Admin>> {
        let sql = format!(
            "SELECT {} FROM admins ORDER BY created_at DESC, id DESC",
            ADMIN_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Admin>(&sql).fetch_all(p).await
        })
        .context("Failed to list admins")
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("UPDATE admins SET password_hash = ? WHERE id = ?")
                .bind(password_hash)
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to update admin password")
    }

    async fn count(&self) -> Result<i64> {
        with_pool!(self.pool, |p| {
            sqlx::query("SELECT COUNT(*) AS n FROM admins")
                .fetch_one(p)
                .await
                .map(|row| row.get::<i64, _>("n"))
        })
        .context("Failed to count admins")
    }
}
