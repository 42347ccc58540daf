//! Contact form messages from the public site

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContactMessage {
    pub id: i64,
    /// Student ID number typed into the form
    pub student_id: String,
    pub email: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub status: ContactStatus,
    /// Name of the staff member who closed the query
    pub resolved_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    pub fn is_resolved(&self) -> bool {
        self.status == ContactStatus::Resolved
    }
}

string_enum! {
    pub enum ContactStatus {
        Pending => "pending",
        Resolved => "resolved",
    }
}

/// Inbox tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactFilter {
    #[default]
    All,
    /// Anything not yet resolved
    Unread,
    Resolved,
}

impl ContactFilter {
    pub fn parse(value: Option<&str>) -> Result<Self, super::ParseEnumError> {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("all") => Ok(Self::All),
            Some("unread") | Some("pending") => Ok(Self::Unread),
            Some("resolved") => Ok(Self::Resolved),
            Some(other) => Err(super::ParseEnumError::new("ContactFilter", other)),
        }
    }

    pub fn matches(&self, message: &ContactMessage) -> bool {
        match self {
            Self::All => true,
            Self::Unread => !message.is_resolved(),
            Self::Resolved => message.is_resolved(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContactInput {
    pub student_id: String,
    pub email: String,
    pub message: String,
}
