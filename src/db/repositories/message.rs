//! Message repository
//!
//! One table carries task comments, admin-team chat and intern-to-intern
//! chat, distinguished by `kind`. Read cursors live in `message_reads`,
//! keyed by reader and conversation.

use crate::config::DatabaseDriver;
use crate::db::{DynDatabasePool, InsertedId};
use crate::models::{Message, MessageKind, Participant};
use crate::with_pool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::collections::HashMap;
use std::sync::Arc;

const MESSAGE_COLUMNS: &str =
    "id, sender, sender_name, recipient, kind, task_id, text, created_at";

/// Message repository trait
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: &Message) -> Result<Message>;

    /// Chat messages (not task comments) sent by or to `participant`, oldest first
    async fn list_chat_involving(&self, participant: Participant) -> Result<Vec<Message>>;

    /// Comment thread of a task, oldest first
    async fn list_for_task(&self, task_id: i64) -> Result<Vec<Message>>;

    /// Remove every message sent by or to `participant`
    async fn delete_involving(&self, participant: Participant) -> Result<u64>;

    async fn get_read_cursor(&self, reader: Participant, conversation: &str) -> Result<i64>;

    /// Advance a read cursor. A cursor never moves backwards.
    async fn set_read_cursor(
        &self,
        reader: Participant,
        conversation: &str,
        last_seen_id: i64,
    ) -> Result<()>;

    /// All cursors of one reader, keyed by conversation
    async fn read_cursors(&self, reader: Participant) -> Result<HashMap<String, i64>>;

    /// Remove cursors held by `participant` and, for an intern, every
    /// reader's cursor on their `team:` and `peer:` conversations
    async fn delete_cursors_involving(&self, participant: Participant) -> Result<u64>;
}

/// SQLx-based message repository, SQLite and MySQL
pub struct SqlxMessageRepository {
    pool: DynDatabasePool,
}

impl SqlxMessageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MessageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MessageRepository for SqlxMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                r#"
                INSERT INTO messages (sender, sender_name, recipient, kind, task_id, text, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(message.sender.to_string())
            .bind(&message.sender_name)
            .bind(message.recipient.to_string())
            .bind(message.kind.as_str())
            .bind(message.task_id)
            .bind(&message.text)
            .bind(message.created_at)
            .execute(p)
            .await
            .map(|r| r.inserted_id())
        })
        .context("Failed to create message")?;

        Ok(Message {
            id,
            ..message.clone()
        })
    }

    async fn list_chat_involving(&self, participant: Participant) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE kind <> ? AND (sender = ? OR recipient = ?) ORDER BY id ASC",
            MESSAGE_COLUMNS
        );
        let key = participant.to_string();
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Message>(&sql)
                .bind(MessageKind::Task.as_str())
                .bind(&key)
                .bind(&key)
                .fetch_all(p)
                .await
        })
        .context("Failed to list chat messages")
    }

    async fn list_for_task(&self, task_id: i64) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE kind = ? AND task_id = ? ORDER BY id ASC",
            MESSAGE_COLUMNS
        );
        with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Message>(&sql)
                .bind(MessageKind::Task.as_str())
                .bind(task_id)
                .fetch_all(p)
                .await
        })
        .context("Failed to list task comments")
    }

    async fn delete_involving(&self, participant: Participant) -> Result<u64> {
        let key = participant.to_string();
        with_pool!(self.pool, |p| {
            sqlx::query("DELETE FROM messages WHERE sender = ? OR recipient = ?")
                .bind(&key)
                .bind(&key)
                .execute(p)
                .await
                .map(|r| r.rows_affected())
        })
        .context("Failed to delete messages")
    }

    async fn get_read_cursor(&self, reader: Participant, conversation: &str) -> Result<i64> {
        let reader = reader.to_string();
        let row = with_pool!(self.pool, |p| {
            sqlx::query(
                "SELECT last_seen_id FROM message_reads WHERE reader = ? AND conversation = ?",
            )
            .bind(&reader)
            .bind(conversation)
            .fetch_optional(p)
            .await
            .map(|row| row.map(|r| r.get::<i64, _>("last_seen_id")))
        })
        .context("Failed to get read cursor")?;

        Ok(row.unwrap_or(0))
    }

    async fn set_read_cursor(
        &self,
        reader: Participant,
        conversation: &str,
        last_seen_id: i64,
    ) -> Result<()> {
        let sql = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                r#"
                INSERT INTO message_reads (reader, conversation, last_seen_id, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(reader, conversation) DO UPDATE SET
                    last_seen_id = MAX(message_reads.last_seen_id, excluded.last_seen_id),
                    updated_at = excluded.updated_at
                "#
            }
            DatabaseDriver::Mysql => {
                r#"
                INSERT INTO message_reads (reader, conversation, last_seen_id, updated_at)
                VALUES (?, ?, ?, ?)
                ON DUPLICATE KEY UPDATE
                    last_seen_id = GREATEST(last_seen_id, VALUES(last_seen_id)),
                    updated_at = VALUES(updated_at)
                "#
            }
        };
        let reader = reader.to_string();
        let now = Utc::now();
        with_pool!(self.pool, |p| {
            sqlx::query(sql)
                .bind(&reader)
                .bind(conversation)
                .bind(last_seen_id)
                .bind(now)
                .execute(p)
                .await
                .map(|_| ())
        })
        .context("Failed to set read cursor")
    }

    async fn read_cursors(&self, reader: Participant) -> Result<HashMap<String, i64>> {
        let reader = reader.to_string();
        let rows = with_pool!(self.pool, |p| {
            sqlx::query("SELECT conversation, last_seen_id FROM message_reads WHERE reader = ?")
                .bind(&reader)
                .fetch_all(p)
                .await
                .map(|rows| {
                    rows.iter()
                        .map(|r| {
                            (
                                r.get::<String, _>("conversation"),
                                r.get::<i64, _>("last_seen_id"),
                            )
                        })
                        .collect::<Vec<_>>()
                })
        })
        .context("Failed to list read cursors")?;

        Ok(rows.into_iter().collect())
    }

    async fn delete_cursors_involving(&self, participant: Participant) -> Result<u64> {
        let reader = participant.to_string();
        // Patterns that match nothing when the participant is not an intern
        let (team, peer_low, peer_high) = match participant.intern_id() {
            Some(id) => (
                format!("team:{}", id),
                format!("peer:{}:%", id),
                format!("peer:%:{}", id),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        with_pool!(self.pool, |p| {
            sqlx::query(
                "DELETE FROM message_reads WHERE reader = ? OR conversation = ? \
                 OR conversation LIKE ? OR conversation LIKE ?",
            )
            .bind(&reader)
            .bind(&team)
            .bind(&peer_low)
            .bind(&peer_high)
            .execute(p)
            .await
            .map(|r| r.rows_affected())
        })
        .context("Failed to delete read cursors")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxMessageRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let sqlite = pool.as_sqlite().unwrap();
        sqlx::query("INSERT INTO interns (id, name, email, password_hash) VALUES (1, 'Asha', 'a@x.com', 'h'), (2, 'Ravi', 'r@x.com', 'h')")
            .execute(sqlite)
            .await
            .unwrap();
        sqlx::query("INSERT INTO tasks (id, title, description, assigned_to, assigned_name) VALUES (10, 'Report', '', 1, 'Asha')")
            .execute(sqlite)
            .await
            .unwrap();
        SqlxMessageRepository::new(pool)
    }

    fn message(sender: Participant, recipient: Participant, text: &str) -> Message {
        Message {
            id: 0,
            sender,
            sender_name: "someone".to_string(),
            recipient,
            kind: MessageKind::for_chat(sender, recipient),
            task_id: None,
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }

    fn task_comment(sender: Participant, text: &str) -> Message {
        Message {
            kind: MessageKind::Task,
            task_id: Some(10),
            ..message(sender, Participant::AdminTeam, text)
        }
    }

    #[tokio::test]
    async fn test_chat_excludes_task_comments() {
        let repo = setup_test_repo().await;
        repo.create(&message(Participant::Intern(1), Participant::AdminTeam, "hello"))
            .await
            .unwrap();
        repo.create(&message(Participant::Intern(2), Participant::Intern(1), "hi"))
            .await
            .unwrap();
        repo.create(&task_comment(Participant::Intern(1), "done"))
            .await
            .unwrap();

        let chat = repo.list_chat_involving(Participant::Intern(1)).await.unwrap();
        let texts: Vec<&str> = chat.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "hi"]);

        let thread = repo.list_for_task(10).await.unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].sender, Participant::Intern(1));
        assert_eq!(thread[0].task_id, Some(10));
    }

    #[tokio::test]
    async fn test_task_comments_cascade_with_task() {
        let repo = setup_test_repo().await;
        repo.create(&task_comment(Participant::Admin(1), "start"))
            .await
            .unwrap();

        sqlx::query("DELETE FROM tasks WHERE id = 10")
            .execute(repo.pool.as_sqlite().unwrap())
            .await
            .unwrap();

        assert!(repo.list_for_task(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_cursor_is_monotonic() {
        let repo = setup_test_repo().await;
        let reader = Participant::Intern(1);

        assert_eq!(repo.get_read_cursor(reader, "team:1").await.unwrap(), 0);

        repo.set_read_cursor(reader, "team:1", 7).await.unwrap();
        repo.set_read_cursor(reader, "team:1", 3).await.unwrap();
        assert_eq!(repo.get_read_cursor(reader, "team:1").await.unwrap(), 7);

        repo.set_read_cursor(reader, "peer:1:2", 9).await.unwrap();
        let cursors = repo.read_cursors(reader).await.unwrap();
        assert_eq!(cursors.len(), 2);
        assert_eq!(cursors["peer:1:2"], 9);

        assert!(repo.read_cursors(Participant::Intern(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_involving() {
        let repo = setup_test_repo().await;
        repo.create(&message(Participant::Intern(1), Participant::Intern(2), "x"))
            .await
            .unwrap();
        repo.create(&message(Participant::Intern(2), Participant::AdminTeam, "y"))
            .await
            .unwrap();

        assert_eq!(repo.delete_involving(Participant::Intern(1)).await.unwrap(), 1);
        assert_eq!(
            repo.list_chat_involving(Participant::Intern(2)).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_delete_cursors_involving_intern() {
        let repo = setup_test_repo().await;
        sqlx::query("INSERT INTO interns (id, name, email, password_hash) VALUES (12, 'Meera', 'm@x.com', 'h')")
            .execute(repo.pool.as_sqlite().unwrap())
            .await
            .unwrap();

        repo.set_read_cursor(Participant::Intern(1), "team:1", 4).await.unwrap();
        repo.set_read_cursor(Participant::Intern(1), "task:10", 2).await.unwrap();
        repo.set_read_cursor(Participant::Admin(5), "team:1", 4).await.unwrap();
        repo.set_read_cursor(Participant::Intern(2), "peer:1:2", 6).await.unwrap();
        repo.set_read_cursor(Participant::Intern(12), "peer:1:12", 6).await.unwrap();
        // Cursors that do not involve intern 1
        repo.set_read_cursor(Participant::Admin(5), "team:12", 3).await.unwrap();
        repo.set_read_cursor(Participant::Intern(2), "peer:2:12", 8).await.unwrap();
        repo.set_read_cursor(Participant::Intern(12), "team:12", 1).await.unwrap();

        let removed = repo
            .delete_cursors_involving(Participant::Intern(1))
            .await
            .unwrap();
        assert_eq!(removed, 5);

        assert_eq!(
            repo.read_cursors(Participant::Admin(5)).await.unwrap().keys().collect::<Vec<_>>(),
            vec!["team:12"]
        );
        assert_eq!(repo.read_cursors(Participant::Intern(2)).await.unwrap().len(), 1);
        assert_eq!(repo.read_cursors(Participant::Intern(12)).await.unwrap().len(), 1);
        assert!(repo.read_cursors(Participant::Intern(1)).await.unwrap().is_empty());
    }
}
