//! Intern repository

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::{Intern, InternStatus};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

const INTERN_COLUMNS: &str = "id, name, email, branch, year, status, password_hash, created_at";

/// Intern repository trait
#[async_trait]
pub trait InternRepository: Send + Sync {
    /// Insert an intern; the returned copy carries the new id
    async fn create(&self, intern: &Intern) -> Result<Intern>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Intern>>;

    /// Lookup by login email (case-insensitive)
    async fn get_by_email(&self, email: &str) -> Result<Option<Intern>>;

    /// All interns, newest first
    async fn list(&self) -> Result<Vec<Intern>>;

    /// Returns false if no such intern existed
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn update_status(&self, id: i64, status: InternStatus) -> Result<bool>;

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool>;

    async fn count_by_status(&self, status: Option<InternStatus>) -> Result<i64>;
}

/// SQLx-based intern repository, SQLite and MySQL
pub struct SqlxInternRepository {
    pool: DynDatabasePool,
}

impl SqlxInternRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn InternRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl InternRepository for SqlxInternRepository {
    async fn create(&self, intern: &Intern) -> Result<Intern> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                r#"
                INSERT INTO interns (name, email, branch, year, status, password_hash, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&intern.name)
            .bind(&intern.email)
            .bind(&intern.branch)
            .bind(&intern.year)
            .bind(intern.status.as_str())
            .bind(&intern.password_hash)
            .bind(intern.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create intern")?;

        Ok(Intern {
            id,
            ..intern.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Intern>> {
        let sql = format!("SELECT {} FROM interns WHERE id = ?", INTERN_COLUMNS);
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Intern>(&sql).bind(id).fetch_optional(p).await
        })
        .context("Failed to get intern by ID")
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Intern>> {
        let sql = format!(
            "SELECT {} FROM interns WHERE LOWER(email) = LOWER(?)",
            INTERN_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Intern>(&sql)
                .bind(email.trim())
                .fetch_optional(p)
                .await
        })
        .context("Failed to get intern by email")
    }

    async fn list(&self) -> Result<Vec<Intern>> {
        let sql = format!(
            "SELECT {} FROM interns ORDER BY created_at DESC, id DESC",
            INTERN_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Intern>(&sql).fetch_all(p).await
        })
        .context("Failed to list interns")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM interns WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to delete intern")
    }

    async fn update_status(&self, id: i64, status: InternStatus) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("UPDATE interns SET status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to update intern status")
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("UPDATE interns SET password_hash = ? WHERE id = ?")
                .bind(password_hash)
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to update intern password")
    }

    async fn count_by_status(&self, status: Option<InternStatus>) -> Result<i64> {
        with_pool!(self.pool, |p| {
            let row = match status {
                Some(status) => {
                    sqlx::query("SELECT COUNT(*) AS n FROM interns WHERE status = ?")
                        .bind(status.as_str())
                        .fetch_one(p)
                        .await
                }
                None => {
                    sqlx::query("SELECT COUNT(*) AS n FROM interns")
                        .fetch_one(p)
                        .await
                }
            };
            row.map(|row| row.get::<i64, _>("n"))
        })
        .context("Failed to count interns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Utc;

    async fn setup_test_repo() -> SqlxInternRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxInternRepository::new(pool)
    }

    fn intern(name: &str, email: &str) -> Intern {
        Intern {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            branch: "ECE".to_string(),
            year: "E2".to_string(),
            status: InternStatus::Active,
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_get_and_list() {
        let repo = setup_test_repo().await;
        let first = repo.create(&intern("Anil", "anil@example.com")).await.unwrap();
        let second = repo.create(&intern("Bhavya", "bhavya@example.com")).await.unwrap();

        let fetched = repo.get_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Anil");
        assert_eq!(fetched.status, InternStatus::Active);

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);

        let by_email = repo.get_by_email("BHAVYA@example.com").await.unwrap();
        assert_eq!(by_email.map(|i| i.id), Some(second.id));
    }

    #[tokio::test]
    async fn test_status_password_and_counts() {
        let repo = setup_test_repo().await;
        let a = repo.create(&intern("A", "a@example.com")).await.unwrap();
        repo.create(&intern("B", "b@example.com")).await.unwrap();

        assert!(repo.update_status(a.id, InternStatus::Inactive).await.unwrap());
        assert!(repo.update_password(a.id, "new-hash").await.unwrap());
        assert!(!repo.update_status(999, InternStatus::Active).await.unwrap());

        let a = repo.get_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(a.status, InternStatus::Inactive);
        assert_eq!(a.password_hash, "new-hash");

        assert_eq!(repo.count_by_status(None).await.unwrap(), 2);
        assert_eq!(repo.count_by_status(Some(InternStatus::Active)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_test_repo().await;
        let a = repo.create(&intern("A", "a@example.com")).await.unwrap();

        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert!(repo.get_by_id(a.id).await.unwrap().is_none());
    }
}
