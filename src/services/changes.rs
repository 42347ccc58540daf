//! Change feed
//!
//! Every successful write publishes a [`ChangeEvent`]. Subscribers (the SSE
//! endpoint) receive them through a tokio broadcast channel, and the public
//! listing cache drops the entries built from the changed table.

use crate::cache::{CacheLayer, SharedCache};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events buffered per subscriber before it is considered lagged
const CHANNEL_CAPACITY: usize = 256;

/// Tables behind the public pages; changes to anything else stay private
pub const PUBLIC_TABLES: &[&str] = &["events", "gallery", "mous", "ticker_settings"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub action: ChangeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn is_public(&self) -> bool {
        PUBLIC_TABLES.contains(&self.table.as_str())
    }
}

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
    cache: Option<SharedCache>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx, cache: None }
    }

    /// A feed that also invalidates `<table>:*` in `cache` on every change
    pub fn with_cache(cache: SharedCache) -> Self {
        Self {
            cache: Some(cache),
            ..Self::new()
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub async fn publish(&self, table: &str, action: ChangeAction, id: Option<i64>) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.delete_pattern(&format!("{}:*", table)).await {
                tracing::warn!("Failed to invalidate cache for {}: {}", table, e);
            }
        }

        let event = ChangeEvent {
            table: table.to_string(),
            action,
            id,
            at: Utc::now(),
        };
        tracing::debug!("change {} {:?} {:?}", table, action, id);
        // No receivers is not an error
        let _ = self.tx.send(event);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
