//! Database migrations
//!
//! Migrations are embedded in the binary as SQL strings, one variant per
//! backend. Applied versions are recorded in `_migrations`, so running the
//! migrator on every startup is safe.
//!
//! ```ignore
//! use eitp::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::DynDatabasePool;
use crate::config::DatabaseDriver;
use crate::with_pool;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All portal migrations, in order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_admins",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS admins (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_interns",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS interns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                branch VARCHAR(100) NOT NULL DEFAULT '',
                year VARCHAR(20) NOT NULL DEFAULT '',
                status VARCHAR(20) NOT NULL DEFAULT 'Active',
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_interns_name ON interns(name);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS interns (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                branch VARCHAR(100) NOT NULL DEFAULT '',
                year VARCHAR(20) NOT NULL DEFAULT '',
                status VARCHAR(20) NOT NULL DEFAULT 'Active',
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_interns_name ON interns(name);
        "#,
    },
    Migration {
        version: 3,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                principal VARCHAR(32) NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_principal ON sessions(principal);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                principal VARCHAR(32) NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_sessions_principal ON sessions(principal);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 4,
        name: "create_tasks",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT NOT NULL,
                assigned_to INTEGER,
                assigned_name VARCHAR(100) NOT NULL,
                due_date DATE,
                priority VARCHAR(20) NOT NULL DEFAULT 'Medium',
                status VARCHAR(20) NOT NULL DEFAULT 'Pending',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (assigned_to) REFERENCES interns(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_assigned_to ON tasks(assigned_to);
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT NOT NULL,
                assigned_to BIGINT,
                assigned_name VARCHAR(100) NOT NULL,
                due_date DATE,
                priority VARCHAR(20) NOT NULL DEFAULT 'Medium',
                status VARCHAR(20) NOT NULL DEFAULT 'Pending',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (assigned_to) REFERENCES interns(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_tasks_assigned_to ON tasks(assigned_to);
            CREATE INDEX idx_tasks_status ON tasks(status);
        "#,
    },
    Migration {
        version: 5,
        name: "create_events",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                kind VARCHAR(20) NOT NULL DEFAULT 'Other',
                description TEXT NOT NULL,
                date DATE,
                start_date DATE,
                deadline DATE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS events (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                kind VARCHAR(20) NOT NULL DEFAULT 'Other',
                description TEXT NOT NULL,
                date DATE,
                start_date DATE,
                deadline DATE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 6,
        name: "create_gallery",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS gallery (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                url TEXT NOT NULL,
                uploader VARCHAR(100) NOT NULL,
                date DATE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS gallery (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                url TEXT NOT NULL,
                uploader VARCHAR(100) NOT NULL,
                date DATE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 7,
        name: "create_notifications",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject VARCHAR(255) NOT NULL,
                kind VARCHAR(20) NOT NULL DEFAULT 'info',
                message TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS notification_dismissals (
                intern_id INTEGER NOT NULL,
                notification_id INTEGER NOT NULL,
                dismissed_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (intern_id, notification_id),
                FOREIGN KEY (intern_id) REFERENCES interns(id) ON DELETE CASCADE,
                FOREIGN KEY (notification_id) REFERENCES notifications(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                subject VARCHAR(255) NOT NULL,
                kind VARCHAR(20) NOT NULL DEFAULT 'info',
                message TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS notification_dismissals (
                intern_id BIGINT NOT NULL,
                notification_id BIGINT NOT NULL,
                dismissed_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (intern_id, notification_id),
                FOREIGN KEY (intern_id) REFERENCES interns(id) ON DELETE CASCADE,
                FOREIGN KEY (notification_id) REFERENCES notifications(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 8,
        name: "create_submissions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                intern_id INTEGER NOT NULL,
                intern_name VARCHAR(100) NOT NULL,
                title VARCHAR(255) NOT NULL,
                file_name VARCHAR(255) NOT NULL,
                file_url VARCHAR(512) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'Pending',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (intern_id) REFERENCES interns(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_submissions_intern_id ON submissions(intern_id);
            CREATE TABLE IF NOT EXISTS submission_comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                submission_id INTEGER NOT NULL,
                sender VARCHAR(100) NOT NULL,
                role VARCHAR(10) NOT NULL,
                text TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (submission_id) REFERENCES submissions(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_submission_comments_submission ON submission_comments(submission_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                intern_id BIGINT NOT NULL,
                intern_name VARCHAR(100) NOT NULL,
                title VARCHAR(255) NOT NULL,
                file_name VARCHAR(255) NOT NULL,
                file_url VARCHAR(512) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'Pending',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (intern_id) REFERENCES interns(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_submissions_intern_id ON submissions(intern_id);
            CREATE TABLE IF NOT EXISTS submission_comments (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                submission_id BIGINT NOT NULL,
                sender VARCHAR(100) NOT NULL,
                role VARCHAR(10) NOT NULL,
                text TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (submission_id) REFERENCES submissions(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_submission_comments_submission ON submission_comments(submission_id);
        "#,
    },
    Migration {
        version: 9,
        name: "create_messages",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender VARCHAR(32) NOT NULL,
                sender_name VARCHAR(100) NOT NULL,
                recipient VARCHAR(32) NOT NULL,
                kind VARCHAR(20) NOT NULL,
                task_id INTEGER,
                text TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender);
            CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient);
            CREATE INDEX IF NOT EXISTS idx_messages_task_id ON messages(task_id);
            CREATE TABLE IF NOT EXISTS message_reads (
                reader VARCHAR(32) NOT NULL,
                conversation VARCHAR(64) NOT NULL,
                last_seen_id INTEGER NOT NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (reader, conversation)
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS messages (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                sender VARCHAR(32) NOT NULL,
                sender_name VARCHAR(100) NOT NULL,
                recipient VARCHAR(32) NOT NULL,
                kind VARCHAR(20) NOT NULL,
                task_id BIGINT,
                text TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_messages_sender ON messages(sender);
            CREATE INDEX idx_messages_recipient ON messages(recipient);
            CREATE INDEX idx_messages_task_id ON messages(task_id);
            CREATE TABLE IF NOT EXISTS message_reads (
                reader VARCHAR(32) NOT NULL,
                conversation VARCHAR(64) NOT NULL,
                last_seen_id BIGINT NOT NULL,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (reader, conversation)
            );
        "#,
    },
    Migration {
        version: 10,
        name: "create_contact_messages",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS contact_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id VARCHAR(50) NOT NULL,
                email VARCHAR(255) NOT NULL,
                message TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                resolved_by VARCHAR(100),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_contact_messages_status ON contact_messages(status);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS contact_messages (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                student_id VARCHAR(50) NOT NULL,
                email VARCHAR(255) NOT NULL,
                message TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                resolved_by VARCHAR(100),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_contact_messages_status ON contact_messages(status);
        "#,
    },
    Migration {
        version: 11,
        name: "create_mous",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS mous (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                partner VARCHAR(255) NOT NULL,
                scope VARCHAR(255) NOT NULL,
                date DATE,
                duration VARCHAR(100) NOT NULL DEFAULT '',
                status VARCHAR(50) NOT NULL DEFAULT 'Active',
                description TEXT NOT NULL,
                logo_url VARCHAR(512),
                photo_url VARCHAR(512),
                doc_url VARCHAR(512),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS mous (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                partner VARCHAR(255) NOT NULL,
                scope VARCHAR(255) NOT NULL,
                date DATE,
                duration VARCHAR(100) NOT NULL DEFAULT '',
                status VARCHAR(50) NOT NULL DEFAULT 'Active',
                description TEXT NOT NULL,
                logo_url VARCHAR(512),
                photo_url VARCHAR(512),
                doc_url VARCHAR(512),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 12,
        name: "create_documents",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                assigned_to INTEGER,
                assigned_name VARCHAR(100) NOT NULL,
                file_url VARCHAR(512) NOT NULL,
                size VARCHAR(32) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (assigned_to) REFERENCES interns(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_documents_assigned_to ON documents(assigned_to);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS documents (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                assigned_to BIGINT,
                assigned_name VARCHAR(100) NOT NULL,
                file_url VARCHAR(512) NOT NULL,
                size VARCHAR(32) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (assigned_to) REFERENCES interns(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_documents_assigned_to ON documents(assigned_to);
        "#,
    },
    Migration {
        version: 13,
        name: "create_ticker_settings",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS ticker_settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                value VARCHAR(500) NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS ticker_settings (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                value VARCHAR(500) NOT NULL,
                position INT NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
];

/// Run all pending migrations.
///
/// Returns the number of migrations applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    let rows = with_pool!(pool, |p| {
        sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
            .fetch_all(p)
            .await
            .map(|rows| {
                rows.iter()
                    .map(|row| MigrationRecord {
                        version: row.get::<i32, _>("version") as i64,
                        name: row.get("name"),
                        applied_at: row.get("applied_at"),
                    })
                    .collect::<Vec<_>>()
            })
    })
    .context("Failed to read applied migrations")?;

    Ok(rows)
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => migration.up_sqlite,
        DatabaseDriver::Mysql => migration.up_mysql,
    };

    for statement in split_sql_statements(sql) {
        pool.execute(statement)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    with_pool!(pool, |p| {
        sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(p)
            .await
            .map(|_| ())
    })
    .context("Failed to record migration")?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        let mut end = 100;
        while !sql.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &sql[..end])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date_and_pending_count() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert!(!is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());

        run_migrations(&pool).await.expect("Failed to run migrations");

        assert!(is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_intern_email_unique() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();
        let insert = "INSERT INTO interns (name, email, password_hash) VALUES (?, ?, ?)";

        sqlx::query(insert)
            .bind("Asha")
            .bind("asha@example.com")
            .bind("hash")
            .execute(sqlite_pool)
            .await
            .expect("first intern");

        let duplicate = sqlx::query(insert)
            .bind("Asha Again")
            .bind("asha@example.com")
            .bind("hash")
            .execute(sqlite_pool)
            .await;

        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn test_removing_intern_keeps_task_but_drops_dismissals() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        let db = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO interns (id, name, email, password_hash) VALUES (1, 'Ravi', 'ravi@example.com', 'h')")
            .execute(db)
            .await
            .unwrap();
        sqlx::query("INSERT INTO tasks (title, description, assigned_to, assigned_name) VALUES ('Report', '', 1, 'Ravi')")
            .execute(db)
            .await
            .unwrap();
        sqlx::query("INSERT INTO notifications (id, subject, message) VALUES (1, 'Hi', 'Hello')")
            .execute(db)
            .await
            .unwrap();
        sqlx::query("INSERT INTO notification_dismissals (intern_id, notification_id) VALUES (1, 1)")
            .execute(db)
            .await
            .unwrap();

        sqlx::query("DELETE FROM interns WHERE id = 1")
            .execute(db)
            .await
            .unwrap();

        let row = sqlx::query("SELECT assigned_to, assigned_name FROM tasks")
            .fetch_one(db)
            .await
            .unwrap();
        let assigned_to: Option<i64> = row.get("assigned_to");
        let assigned_name: String = row.get("assigned_name");
        assert_eq!(assigned_to, None);
        assert_eq!(assigned_name, "Ravi");

        let dismissals: i64 = sqlx::query("SELECT COUNT(*) AS n FROM notification_dismissals")
            .fetch_one(db)
            .await
            .unwrap()
            .get("n");
        assert_eq!(dismissals, 0);
    }

    #[tokio::test]
    async fn test_submission_requires_existing_intern() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let result = sqlx::query(
            "INSERT INTO submissions (intern_id, intern_name, title, file_name, file_url) VALUES (99, 'Ghost', 'T', 'f', '/u/f')",
        )
        .execute(pool.as_sqlite().unwrap())
        .await;

        assert!(result.is_err());
    }

    #[test]
    fn test_total_migrations() {
        assert_eq!(total_migrations(), 13);
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        let expected: Vec<i32> = (1..=13).collect();
        assert_eq!(versions, expected);
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        assert_eq!(split_sql_statements(sql).len(), 2);

        let sql_with_comments = "-- Comment\nCREATE TABLE a (id INT);\n-- trailing";
        assert_eq!(split_sql_statements(sql_with_comments).len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(is_comment_only("-- Line 1\n-- Line 2"));
        assert!(!is_comment_only("CREATE TABLE test"));
        assert!(!is_comment_only("-- Comment\nCREATE TABLE test"));
    }

    #[test]
    fn test_truncate_sql() {
        let long = "x".repeat(150);
        assert_eq!(truncate_sql(&long).len(), 103);
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
    }
}
