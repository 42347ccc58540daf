//! Admin model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Program administrator with full dashboard access.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Admin {
    pub id: i64,
    pub name: String,
    /// Login email (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating another admin
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdminInput {
    pub name: String,
    pub email: String,
    pub password: String,
}
