//! Task model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::string_enum;

/// An assignment given to one intern.
///
/// The feedback thread lives in `messages` with kind `task`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Assigned intern; `None` once that intern has been removed
    pub assigned_to: Option<i64>,
    /// Intern name at assignment time
    pub assigned_name: String,
    pub due_date: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_assigned_to(&self, intern_id: i64) -> bool {
        self.assigned_to == Some(intern_id)
    }

    /// Anything not completed counts as active work
    pub fn is_active(&self) -> bool {
        self.status != TaskStatus::Completed
    }
}

string_enum! {
    pub enum TaskPriority {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

string_enum! {
    pub enum TaskStatus {
        Pending => "Pending",
        InProgress => "In Progress",
        Completed => "Completed",
    }
}

/// Status tab on the task board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl TaskStatusFilter {
    pub fn parse(value: Option<&str>) -> Result<Self, super::ParseEnumError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::All),
            Some(v) if v.eq_ignore_ascii_case("all") => Ok(Self::All),
            Some(v) => v.parse().map(Self::Only),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => task.status == *status,
        }
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assigned_to: i64,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: TaskPriority,
}
