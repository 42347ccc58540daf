//! Homepage ticker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A custom announcement line managed by admins
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TickerSetting {
    pub id: i64,
    pub value: String,
    /// Display order, ascending
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// What the homepage ticker shows right now
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickerFeed {
    pub items: Vec<String>,
    /// How long each item stays before rotating
    pub rotate_ms: u64,
}
