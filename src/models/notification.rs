//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::string_enum;

/// Subject line used by the dashboard's one-click urgent broadcast
pub const URGENT_BROADCAST_SUBJECT: &str = "Urgent Review Alert";

/// Announcement pushed to every intern
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub subject: String,
    #[sqlx(try_from = "String")]
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

string_enum! {
    pub enum NotificationKind {
        Info => "info",
        Urgent => "urgent",
    }
}

impl Default for NotificationKind {
    fn default() -> Self {
        Self::Info
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationInput {
    pub subject: String,
    #[serde(default, alias = "type")]
    pub kind: NotificationKind,
    pub message: String,
}
