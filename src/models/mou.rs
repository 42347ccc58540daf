//! Memorandum of understanding with an industry partner

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Mou {
    pub id: i64,
    pub partner: String,
    pub scope: String,
    /// Signing date
    pub date: Option<NaiveDate>,
    /// Free text, e.g. "3 Years"
    pub duration: String,
    /// Free text such as "Active" or "Expired"
    pub status: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub photo_url: Option<String>,
    pub doc_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Mou {
    /// Case-insensitive substring match on partner or scope
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.partner.to_lowercase().contains(&query)
            || self.scope.to_lowercase().contains(&query)
    }

    /// `None` and "All" match every status
    pub fn matches_status(&self, status: Option<&str>) -> bool {
        match status.map(str::trim) {
            None | Some("") => true,
            Some(s) if s.eq_ignore_ascii_case("all") => true,
            Some(s) => self.status.eq_ignore_ascii_case(s),
        }
    }
}

/// Text fields of the MoU form; files arrive separately
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMouInput {
    pub partner: String,
    pub scope: String,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
}
