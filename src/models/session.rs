//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Participant;

/// Login session for an admin or an intern
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Who the session belongs to
    #[sqlx(try_from = "String")]
    pub principal: Participant,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
