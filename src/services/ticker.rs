//! Homepage ticker: running events followed by admin-managed announcements

use crate::cache::{get_or_load, SharedCache};
use crate::db::repositories::{EventRepository, TickerRepository};
use crate::models::{Event, EventStatus, TickerFeed, TickerSetting};
use crate::services::auth::Actor;
use crate::services::changes::{ChangeAction, ChangeFeed};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use super::error::{require, PortalError};

const TABLE: &str = "ticker_settings";
const CACHE_KEY: &str = "ticker_settings:all";

/// Delay between ticker items on the homepage
pub const ROTATE_MS: u64 = 6100;

/// Ticker lines for `today`: one `ONGOING` line per running event, then the
/// non-blank settings in position order.
pub fn build_ticker(events: &[Event], settings: &[TickerSetting], today: NaiveDate) -> TickerFeed {
    let mut running: Vec<(NaiveDate, &Event)> = events
        .iter()
        .filter(|e| e.status_on(today) == Some(EventStatus::Running))
        .filter_map(|e| e.start().map(|start| (start, e)))
        .collect();
    running.sort_by_key(|(start, e)| (*start, e.id));

    let mut settings: Vec<&TickerSetting> = settings.iter().collect();
    settings.sort_by_key(|s| (s.position, s.id));

    let items = running
        .into_iter()
        .map(|(start, e)| format!("ONGOING: {} ({})", e.title, start.format("%d %b %Y")))
        .chain(
            settings
                .into_iter()
                .map(|s| s.value.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        )
        .collect();

    TickerFeed {
        items,
        rotate_ms: ROTATE_MS,
    }
}

pub struct TickerService {
    ticker_repo: Arc<dyn TickerRepository>,
    event_repo: Arc<dyn EventRepository>,
    cache: SharedCache,
    changes: ChangeFeed,
}

impl TickerService {
    pub fn new(
        ticker_repo: Arc<dyn TickerRepository>,
        event_repo: Arc<dyn EventRepository>,
        cache: SharedCache,
        changes: ChangeFeed,
    ) -> Self {
        Self {
            ticker_repo,
            event_repo,
            cache,
            changes,
        }
    }

    async fn settings(&self) -> Result<Vec<TickerSetting>, PortalError> {
        get_or_load(&self.cache, CACHE_KEY, || async {
            Ok::<_, PortalError>(self.ticker_repo.list().await?)
        })
        .await
    }

    pub async fn list_ticker_settings(
        &self,
        actor: &Actor,
    ) -> Result<Vec<TickerSetting>, PortalError> {
        actor.require_admin()?;
        self.settings().await
    }

    pub async fn add_ticker_setting(
        &self,
        actor: &Actor,
        value: &str,
    ) -> Result<TickerSetting, PortalError> {
        actor.require_admin()?;
        require(value, "Ticker text")?;

        let setting = TickerSetting {
            id: 0,
            value: value.trim().to_string(),
            position: self.ticker_repo.next_position().await?,
            created_at: Utc::now(),
        };
        let setting = self.ticker_repo.create(&setting).await?;

        self.changes
            .publish(TABLE, ChangeAction::Insert, Some(setting.id))
            .await;
        Ok(setting)
    }

    pub async fn delete_ticker_setting(&self, actor: &Actor, id: i64) -> Result<(), PortalError> {
        actor.require_admin()?;
        if !self.ticker_repo.delete(id).await? {
            return Err(PortalError::not_found(format!("Ticker item {}", id)));
        }
        self.changes.publish(TABLE, ChangeAction::Delete, Some(id)).await;
        Ok(())
    }

    pub async fn ticker_items(&self, today: NaiveDate) -> Result<TickerFeed, PortalError> {
        let events = get_or_load(&self.cache, super::event::CACHE_KEY, || async {
            Ok::<_, PortalError>(self.event_repo.list().await?)
        })
        .await?;
        Ok(build_ticker(&events, &self.settings().await?, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateEventInput, EventKind};
    use crate::services::test_support::TestContext;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event(id: i64, title: &str, start: NaiveDate, deadline: Option<NaiveDate>) -> Event {
        Event {
            id,
            title: title.to_string(),
            kind: EventKind::Workshop,
            description: String::new(),
            date: None,
            start_date: Some(start),
            deadline,
            created_at: Utc::now(),
        }
    }

    fn setting(id: i64, value: &str, position: i32) -> TickerSetting {
        TickerSetting {
            id,
            value: value.to_string(),
            position,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_ticker() {
        let today = d(2024, 3, 10);
        let events = vec![
            event(1, "Hackathon", d(2024, 3, 8), Some(d(2024, 3, 12))),
            event(2, "Old seminar", d(2024, 1, 1), None),
            event(3, "Placement drive", d(2024, 4, 1), None),
        ];
        let settings = vec![
            setting(1, "Second", 1),
            setting(2, "   ", 2),
            setting(3, " First ", 0),
        ];

        let feed = build_ticker(&events, &settings, today);
        assert_eq!(
            feed.items,
            vec!["ONGOING: Hackathon (08 Mar 2024)", "First", "Second"]
        );
        assert_eq!(feed.rotate_ms, 6100);
    }

    #[tokio::test]
    async fn test_ticker_flow() {
        let ctx = TestContext::new().await;
        let service = ctx.ticker_service();
        let events = ctx.event_service();
        let admin = ctx.admin_actor().await;
        let today = Utc::now().date_naive();

        assert!(service.ticker_items(today).await.unwrap().items.is_empty());

        let first = service.add_ticker_setting(&admin, "Registrations open").await.unwrap();
        let second = service.add_ticker_setting(&admin, "Results out").await.unwrap();
        assert_eq!(second.position, first.position + 1);
        assert!(matches!(
            service.add_ticker_setting(&admin, "  ").await,
            Err(PortalError::Validation(_))
        ));

        events
            .add_event(
                &admin,
                CreateEventInput {
                    title: "Expo".to_string(),
                    kind: EventKind::Other,
                    description: String::new(),
                    date: Some(today),
                    start_date: None,
                    deadline: None,
                },
            )
            .await
            .unwrap();

        let feed = service.ticker_items(today).await.unwrap();
        assert_eq!(feed.items.len(), 3);
        assert!(feed.items[0].starts_with("ONGOING: Expo"));

        service.delete_ticker_setting(&admin, first.id).await.unwrap();
        let feed = service.ticker_items(today).await.unwrap();
        assert_eq!(feed.items[1], "Results out");
    }
}
