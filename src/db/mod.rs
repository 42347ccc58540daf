//! Database layer
//!
//! Supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for the campus server)
//!
//! # Usage
//!
//! ```ignore
//! use eitp::config::DatabaseConfig;
//! use eitp::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, InsertedId, MysqlDatabase,
    SqliteDatabase,
};

/// Run the same query code against whichever backend `$pool` wraps.
///
/// The closure-like body is expanded once per driver with `$p` bound to the
/// concrete `SqlitePool` or `MySqlPool`, so plain `sqlx::query(...)` chains
/// type-check against both. Queries must use SQL that both backends accept.
///
/// ```ignore
/// let rows = with_pool!(self.pool, |p| {
///     sqlx::query_as::<_, Task>("SELECT * FROM tasks").fetch_all(p).await
/// })?;
/// ```
#[macro_export]
macro_rules! with_pool {
    ($pool:expr, |$p:ident| $body:expr) => {
        match $pool.driver() {
            $crate::config::DatabaseDriver::Sqlite => {
                let $p = $pool
                    .as_sqlite()
                    .ok_or_else(|| ::anyhow::anyhow!("SQLite pool is not available"))?;
                $body
            }
            $crate::config::DatabaseDriver::Mysql => {
                let $p = $pool
                    .as_mysql()
                    .ok_or_else(|| ::anyhow::anyhow!("MySQL pool is not available"))?;
                $body
            }
        }
    };
}
