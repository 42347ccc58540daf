//! Documents delivered to interns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label stored when a document goes to every intern
pub const ALL_INTERNS_LABEL: &str = "All Interns";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: i64,
    pub title: String,
    /// Target intern; `None` means everyone
    pub assigned_to: Option<i64>,
    pub assigned_name: String,
    pub file_url: String,
    /// Human readable size, e.g. "12.5 KB"
    pub size: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn is_visible_to(&self, intern_id: i64) -> bool {
        self.assigned_to.map_or(true, |id| id == intern_id)
    }
}

/// Text fields of the document form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDocumentInput {
    pub title: String,
    /// Intern id, or empty/"all" for everyone
    pub assigned_to: Option<i64>,
}

/// Format a byte count the way the document list shows it
pub fn format_size_kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_kb() {
        assert_eq!(format_size_kb(0), "0.0 KB");
        assert_eq!(format_size_kb(1024), "1.0 KB");
        assert_eq!(format_size_kb(1536), "1.5 KB");
        assert_eq!(format_size_kb(10 * 1024 * 1024), "10240.0 KB");
    }

    #[test]
    fn test_visibility() {
        let mut doc = Document {
            id: 1,
            title: "Offer letter".to_string(),
            assigned_to: None,
            assigned_name: ALL_INTERNS_LABEL.to_string(),
            file_url: "/uploads/documents/x.pdf".to_string(),
            size: "1.0 KB".to_string(),
            created_at: Utc::now(),
        };
        assert!(doc.is_visible_to(7));

        doc.assigned_to = Some(3);
        assert!(doc.is_visible_to(3));
        assert!(!doc.is_visible_to(7));
    }
}
