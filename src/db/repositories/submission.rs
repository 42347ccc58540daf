//! Submission repository
//!
//! Submissions and their review threads. Each comment is its own row, so
//! concurrent replies never overwrite each other.

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::{Submission, SubmissionComment, SubmissionStatus};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

const SUBMISSION_COLUMNS: &str =
    "id, intern_id, intern_name, title, file_name, file_url, status, created_at";

const COMMENT_COLUMNS: &str = "id, submission_id, sender, role, text, created_at";

/// Submission repository trait
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn create(&self, submission: &Submission) -> Result<Submission>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Submission>>;

    /// All submissions, newest first
    async fn list(&self) -> Result<Vec<Submission>>;

    async fn list_by_intern(&self, intern_id: i64) -> Result<Vec<Submission>>;

    async fn update_status(&self, id: i64, status: SubmissionStatus) -> Result<bool>;

    async fn count_by_status(&self, status: SubmissionStatus) -> Result<i64>;

    /// Append a comment to a submission's thread
    async fn add_comment(&self, comment: &SubmissionComment) -> Result<SubmissionComment>;

    /// Thread of one submission, oldest first
    async fn list_comments(&self, submission_id: i64) -> Result<Vec<SubmissionComment>>;
}

/// SQLx-based submission repository, SQLite and MySQL
pub struct SqlxSubmissionRepository {
    pool: DynDatabasePool,
}

impl SqlxSubmissionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SubmissionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SubmissionRepository for SqlxSubmissionRepository {
    async fn create(&self, submission: &Submission) -> Result<Submission> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                r#"
                INSERT INTO submissions (intern_id, intern_name, title, file_name, file_url, status, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(submission.intern_id)
            .bind(&submission.intern_name)
            .bind(&submission.title)
            .bind(&submission.file_name)
            .bind(&submission.file_url)
            .bind(submission.status.as_str())
            .bind(submission.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create submission")?;

        Ok(Submission {
            id,
            ..submission.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Submission>> {
        let sql = format!("SELECT {} FROM submissions WHERE id = ?", SUBMISSION_COLUMNS);
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Submission>(&sql)
                .bind(id)
                .fetch_optional(p)
                .await
        })
        .context("Failed to get submission by ID")
    }

    async fn list(&self) -> Result<Vec<Submission>> {
        let sql = format!(
            "SELECT {} FROM submissions ORDER BY created_at DESC, id DESC",
            SUBMISSION_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Submission>(&sql).fetch_all(p).await
        })
        .context("Failed to list submissions")
    }

    async fn list_by_intern(&self, intern_id: i64) -> Result<Vec<Submission>> {
        let sql = format!(
            "SELECT {} FROM submissions WHERE intern_id = ? ORDER BY created_at DESC, id DESC",
            SUBMISSION_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Submission>(&sql)
                .bind(intern_id)
                .fetch_all(p)
                .await
        })
        .context("Failed to list submissions by intern")
    }

    async fn update_status(&self, id: i64, status: SubmissionStatus) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("UPDATE submissions SET status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to update submission status")
    }

    async fn count_by_status(&self, status: SubmissionStatus) -> Result<i64> {
        with_pool!(self.pool, |p| {
            sqlx::query("SELECT COUNT(*) AS n FROM submissions WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(p)
                .await
                .map(|row| row.get::<i64, _>("n"))
        })
        .context("Failed to count submissions")
    }

    async fn add_comment(&self, comment: &SubmissionComment) -> Result<SubmissionComment> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                r#"
                INSERT INTO submission_comments (submission_id, sender, role, text, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(comment.submission_id)
            .bind(&comment.sender)
            .bind(comment.role.as_str())
            .bind(&comment.text)
            .bind(comment.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to add submission comment")?;

        Ok(SubmissionComment {
            id,
            ..comment.clone()
        })
    }

    async fn list_comments(&self, submission_id: i64) -> Result<Vec<SubmissionComment>> {
        let sql = format!(
            "SELECT {} FROM submission_comments WHERE submission_id = ? ORDER BY id ASC",
            COMMENT_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, SubmissionComment>(&sql)
                .bind(submission_id)
                .fetch_all(p)
                .await
        })
        .context("Failed to list submission comments")
    }
}
