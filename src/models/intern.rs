//! Intern model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::string_enum;

/// A student enrolled in the internship program.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Intern {
    pub id: i64,
    pub name: String,
    /// Login email (unique)
    pub email: String,
    pub branch: String,
    /// Academic year, e.g. "E3"
    pub year: String,
    #[sqlx(try_from = "String")]
    pub status: InternStatus,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Intern {
    pub fn is_active(&self) -> bool {
        self.status == InternStatus::Active
    }

    /// Case-insensitive substring match on name or email.
    ///
    /// An empty query matches everyone.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.email.to_lowercase().contains(&query)
    }
}

string_enum! {
    /// Whether an intern may still sign in
    pub enum InternStatus {
        Active => "Active",
        Inactive => "Inactive",
    }
}

impl Default for InternStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Input for enrolling an intern
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInternInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub year: String,
}
