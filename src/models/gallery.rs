//! Gallery model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One gallery post. A collage stores several URLs joined with commas.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GalleryEntry {
    pub id: i64,
    pub title: String,
    pub url: String,
    /// Display name of whoever posted it
    pub uploader: String,
    pub date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl GalleryEntry {
    /// Individual image URLs of this entry
    pub fn urls(&self) -> Vec<&str> {
        self.url
            .split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .collect()
    }

    pub fn is_collage(&self) -> bool {
        self.urls().len() > 1
    }

    /// Day used for ordering: the event date if given, else the upload day
    pub fn sort_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| self.created_at.date_naive())
    }
}

/// A single photo flattened out of a gallery entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryPhoto {
    pub entry_id: i64,
    pub title: String,
    pub url: String,
    pub uploader: String,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_split_and_trim() {
        let entry = GalleryEntry {
            id: 1,
            title: "Hackathon".to_string(),
            url: "/uploads/gallery/a.jpg, /uploads/gallery/b.jpg,,".to_string(),
            uploader: "Admin".to_string(),
            date: None,
            created_at: Utc::now(),
        };

        assert_eq!(entry.urls(), vec!["/uploads/gallery/a.jpg", "/uploads/gallery/b.jpg"]);
        assert!(entry.is_collage());
        assert_eq!(entry.sort_date(), entry.created_at.date_naive());
    }
}
