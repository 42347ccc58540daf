//! Task repository

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::{Task, TaskStatus};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

const TASK_COLUMNS: &str =
    "id, title, description, assigned_to, assigned_name, due_date, priority, status, created_at";

/// Task repository trait
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> Result<Task>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Task>>;

    /// All tasks, newest first
    async fn list(&self) -> Result<Vec<Task>>;

    /// Tasks assigned to one intern, newest first
    async fn list_by_intern(&self, intern_id: i64) -> Result<Vec<Task>>;

    async fn update_status(&self, id: i64, status: TaskStatus) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Tasks that are not completed
    async fn count_active(&self) -> Result<i64>;
}

/// SQLx-based task repository, SQLite and MySQL
pub struct SqlxTaskRepository {
    pool: DynDatabasePool,
}

impl SqlxTaskRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TaskRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TaskRepository for SqlxTaskRepository {
    async fn create(&self, task: &Task) -> Result<Task> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                r#"
                INSERT INTO tasks (title, description, assigned_to, assigned_name, due_date, priority, status, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.assigned_to)
            .bind(&task.assigned_name)
            .bind(task.due_date)
            .bind(task.priority.as_str())
            .bind(task.status.as_str())
            .bind(task.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create task")?;

        Ok(Task {
            id,
            ..task.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS);
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Task>(&sql).bind(id).fetch_optional(p).await
        })
        .context("Failed to get task by ID")
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks ORDER BY created_at DESC, id DESC",
            TASK_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Task>(&sql).fetch_all(p).await
        })
        .context("Failed to list tasks")
    }

    async fn list_by_intern(&self, intern_id: i64) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE assigned_to = ? ORDER BY created_at DESC, id DESC",
            TASK_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Task>(&sql)
                .bind(intern_id)
                .fetch_all(p)
                .await
        })
        .context("Failed to list tasks by intern")
    }

    async fn update_status(&self, id: i64, status: TaskStatus) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to update task status")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM tasks WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to delete task")
    }

    async fn count_active(&self) -> Result<i64> {
        with_pool!(self.pool, |p| {
            sqlx::query("SELECT COUNT(*) AS n FROM tasks WHERE status <> ?")
                .bind(TaskStatus::Completed.as_str())
                .fetch_one(p)
                .await
                .map(|row| row.get::<i64, _>("n"))
        })
        .context("Failed to count active tasks")
    }
}
