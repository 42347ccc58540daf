//! Event repository

use crate::db::{DynDatabasePool, InsertedId};
use crate::models::Event;
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

const EVENT_COLUMNS: &str = "id, title, kind, description, date, start_date, deadline, created_at";

/// Event repository trait
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>>;

    /// All events, newest first. Ordering by date happens in the service.
    async fn list(&self) -> Result<Vec<Event>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based event repository, SQLite and MySQL
pub struct SqlxEventRepository {
    pool: DynDatabasePool,
}

impl SqlxEventRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn EventRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EventRepository for SqlxEventRepository {
    async fn create(&self, event: &Event) -> Result<Event> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                r#"
                INSERT INTO events (title, kind, description, date, start_date, deadline, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&event.title)
            .bind(event.kind.as_str())
            .bind(&event.description)
            .bind(event.date)
            .bind(event.start_date)
            .bind(event.deadline)
            .bind(event.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create event")?;

        Ok(Event {
            id,
            ..event.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Event>> {
        let sql = format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS);
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Event>(&sql).bind(id).fetch_optional(p).await
        })
        .context("Failed to get event by ID")
    }

    async fn list(&self) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT {} FROM events ORDER BY created_at DESC, id DESC",
            EVENT_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Event>(&sql).fetch_all(p).await
        })
        .context("Failed to list events")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM events WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected() > 0)
        })
        .context("Failed to delete event")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::EventKind;
    use chrono::{NaiveDate, Utc};

    #[tokio::test]
    async fn test_event_dates_round_trip_through_storage() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxEventRepository::new(pool);

        let event = Event {
            id: 0,
            title: "Skill Census".to_string(),
            kind: EventKind::Seminar,
            description: "Registration drive".to_string(),
            date: None,
            start_date: NaiveDate::from_ymd_opt(2024, 10, 1),
            deadline: NaiveDate::from_ymd_opt(2024, 10, 15),
            created_at: Utc::now(),
        };

        let created = repo.create(&event).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.kind, EventKind::Seminar);
        assert_eq!(fetched.date, None);
        assert_eq!(fetched.start_date, NaiveDate::from_ymd_opt(2024, 10, 1));
        assert_eq!(fetched.deadline, NaiveDate::from_ymd_opt(2024, 10, 15));

        assert_eq!(repo.list().await.unwrap().len(), 1);
        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }
}
