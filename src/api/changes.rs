//! Change streams
//!
//! - GET /api/v1/changes - Changes to the public listings (events, gallery,
//!   MoUs, ticker). No auth.
//! - GET /api/v1/changes/all - Every change. Requires authentication.
//!
//! Both are Server-Sent Events streams. Each write arrives as a `change`
//! event carrying `{ table, action, id?, at }`. A client that falls behind
//! the broadcast buffer gets a single `resync` event and should refetch
//! whatever it shows.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::{self, Stream};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::api::middleware::AppState;
use crate::services::ChangeEvent;

const KEEP_ALIVE_SECS: u64 = 15;

/// Who is listening, and so which changes they get
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Public,
    Staff,
}

impl Audience {
    fn sees(self, change: &ChangeEvent) -> bool {
        match self {
            Audience::Public => change.is_public(),
            Audience::Staff => true,
        }
    }
}

/// What one receive from the feed turns into
#[derive(Debug, PartialEq)]
enum FeedItem {
    Change(ChangeEvent),
    /// Number of events the subscriber missed
    Resync(u64),
}

impl FeedItem {
    fn from_recv(result: Result<ChangeEvent, RecvError>) -> Option<Self> {
        match result {
            Ok(change) => Some(FeedItem::Change(change)),
            Err(RecvError::Lagged(missed)) => Some(FeedItem::Resync(missed)),
            Err(RecvError::Closed) => None,
        }
    }

    fn into_event(self) -> Result<Event, axum::Error> {
        match self {
            FeedItem::Change(change) => Event::default().event("change").json_data(&change),
            FeedItem::Resync(missed) => {
                tracing::debug!("change subscriber lagged by {} events", missed);
                Ok(Event::default().event("resync").data(missed.to_string()))
            }
        }
    }
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(stream_public_changes))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/all", get(stream_all_changes))
}

fn feed_stream(
    rx: broadcast::Receiver<ChangeEvent>,
    audience: Audience,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    stream::unfold(rx, move |mut rx| async move {
        loop {
            let item = FeedItem::from_recv(rx.recv().await)?;
            if let FeedItem::Change(change) = &item {
                if !audience.sees(change) {
                    continue;
                }
            }
            return Some((item.into_event(), rx));
        }
    })
}

fn sse(
    state: &AppState,
    audience: Audience,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    Sse::new(feed_stream(state.changes.subscribe(), audience)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("ping"),
    )
}

async fn stream_public_changes(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    sse(&state, Audience::Public)
}

async fn stream_all_changes(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    sse(&state, Audience::Staff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ChangeAction, ChangeFeed};
    use futures::StreamExt;

    #[tokio::test]
    async fn test_feed_items_follow_published_changes() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();

        feed.publish("tasks", ChangeAction::Insert, Some(4)).await;

        match FeedItem::from_recv(rx.recv().await) {
            Some(FeedItem::Change(change)) => {
                assert_eq!(change.table, "tasks");
                assert_eq!(change.action, ChangeAction::Insert);
                assert_eq!(change.id, Some(4));
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn test_lag_becomes_resync_and_close_ends() {
        assert_eq!(
            FeedItem::from_recv(Err(RecvError::Lagged(12))),
            Some(FeedItem::Resync(12))
        );
        assert_eq!(FeedItem::from_recv(Err(RecvError::Closed)), None);
    }

    #[tokio::test]
    async fn test_stream_ends_when_feed_is_dropped() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();
        feed.publish("events", ChangeAction::Delete, Some(1)).await;
        drop(feed);

        let items: Vec<_> = feed_stream(rx, Audience::Public).collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_ok());
    }

    #[tokio::test]
    async fn test_public_stream_skips_private_tables() {
        let feed = ChangeFeed::new();
        let public_rx = feed.subscribe();
        let staff_rx = feed.subscribe();

        feed.publish("messages", ChangeAction::Insert, Some(7)).await;
        feed.publish("contact_messages", ChangeAction::Insert, Some(2)).await;
        feed.publish("gallery", ChangeAction::Insert, Some(3)).await;
        drop(feed);

        let public: Vec<_> = feed_stream(public_rx, Audience::Public).collect().await;
        assert_eq!(public.len(), 1);
        assert!(public[0].is_ok());

        let staff: Vec<_> = feed_stream(staff_rx, Audience::Staff).collect().await;
        assert_eq!(staff.len(), 3);
    }

    #[test]
    fn test_audiences() {
        let change = |table: &str| ChangeEvent {
            table: table.to_string(),
            action: ChangeAction::Update,
            id: None,
            at: chrono::Utc::now(),
        };
        assert!(!Audience::Public.sees(&change("messages")));
        assert!(Audience::Public.sees(&change("ticker_settings")));
        assert!(Audience::Staff.sees(&change("messages")));
    }
}
