//! Submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::string_enum;

/// A file an intern handed in for review
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Submission {
    pub id: i64,
    pub intern_id: i64,
    pub intern_name: String,
    pub title: String,
    /// Original file name as uploaded
    pub file_name: String,
    pub file_url: String,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
}

string_enum! {
    pub enum SubmissionStatus {
        Pending => "Pending",
        Reviewed => "Reviewed",
    }
}

/// Entry in a submission's review thread. Comments are never edited.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubmissionComment {
    pub id: i64,
    pub submission_id: i64,
    /// Display name of the author
    pub sender: String,
    #[sqlx(try_from = "String")]
    pub role: CommentRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

string_enum! {
    pub enum CommentRole {
        Admin => "admin",
        Intern => "intern",
    }
}
