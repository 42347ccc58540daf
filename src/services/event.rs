//! Events: publishing, status-filtered listing and the public calendar

use crate::cache::{get_or_load, SharedCache};
use crate::db::repositories::EventRepository;
use crate::models::{CreateEventInput, Event, EventFilter, EventStatus};
use crate::services::auth::Actor;
use crate::services::changes::{ChangeAction, ChangeFeed};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::error::{require, PortalError};

const TABLE: &str = "events";
pub(crate) const CACHE_KEY: &str = "events:all";

/// An event with its derived dates and status for a given day
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub status: Option<EventStatus>,
}

impl EventView {
    pub fn on(event: Event, today: NaiveDate) -> Self {
        Self {
            start: event.start(),
            end: event.end(),
            status: event.status_on(today),
            event,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub day: u32,
    pub date: NaiveDate,
    pub events: Vec<EventView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub name: String,
    pub days_in_month: u32,
    /// Weekday of the 1st, Sunday = 0
    pub first_weekday: u32,
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarLists {
    pub upcoming: Vec<EventView>,
    pub past: Vec<EventView>,
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

/// Build a month grid; each day lists the events whose range covers it.
pub fn build_calendar(
    events: &[Event],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Option<CalendarMonth> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let days_in_month = days_in_month(year, month)?;

    let days = (1..=days_in_month)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .map(|date| CalendarDay {
            day: date.day(),
            date,
            events: events
                .iter()
                .filter(|e| e.covers(date))
                .cloned()
                .map(|e| EventView::on(e, today))
                .collect(),
        })
        .collect();

    Some(CalendarMonth {
        year,
        month,
        name: first.format("%B").to_string(),
        days_in_month,
        first_weekday: first.weekday().num_days_from_sunday(),
        days,
    })
}

/// Split dated events into upcoming (end on or after today, soonest first)
/// and past (most recent first).
pub fn split_calendar_lists(events: Vec<Event>, today: NaiveDate) -> CalendarLists {
    let (mut upcoming, mut past): (Vec<EventView>, Vec<EventView>) = events
        .into_iter()
        .filter(|e| e.start().is_some())
        .map(|e| EventView::on(e, today))
        .partition(|v| v.end.is_some_and(|end| end >= today));

    upcoming.sort_by_key(|v| (v.start, v.event.id));
    past.sort_by(|a, b| (b.start, b.event.id).cmp(&(a.start, a.event.id)));
    CalendarLists { upcoming, past }
}

pub struct EventService {
    event_repo: Arc<dyn EventRepository>,
    cache: SharedCache,
    changes: ChangeFeed,
}

impl EventService {
    pub fn new(event_repo: Arc<dyn EventRepository>, cache: SharedCache, changes: ChangeFeed) -> Self {
        Self {
            event_repo,
            cache,
            changes,
        }
    }

    async fn all(&self) -> Result<Vec<Event>, PortalError> {
        get_or_load(&self.cache, CACHE_KEY, || async {
            Ok::<_, PortalError>(self.event_repo.list().await?)
        })
        .await
    }

    /// Publish an event. Any staff member (admin or intern) may publish.
    pub async fn add_event(&self, actor: &Actor, input: CreateEventInput) -> Result<Event, PortalError> {
        require(&input.title, "Title")?;
        if input.date.is_none() && input.start_date.is_none() {
            return Err(PortalError::validation("A date or start date is required"));
        }

        let event = Event {
            id: 0,
            title: input.title.trim().to_string(),
            kind: input.kind,
            description: input.description.trim().to_string(),
            date: input.date,
            start_date: input.start_date,
            deadline: input.deadline,
            created_at: Utc::now(),
        };
        let event = self.event_repo.create(&event).await?;

        tracing::info!("{} published event {}", actor.participant(), event.id);
        self.changes
            .publish(TABLE, ChangeAction::Insert, Some(event.id))
            .await;
        Ok(event)
    }

    pub async fn delete_event(&self, actor: &Actor, id: i64) -> Result<(), PortalError> {
        if !self.event_repo.delete(id).await? {
            return Err(PortalError::not_found(format!("Event {}", id)));
        }
        tracing::info!("{} deleted event {}", actor.participant(), id);
        self.changes.publish(TABLE, ChangeAction::Delete, Some(id)).await;
        Ok(())
    }

    /// Dated events matching `filter`, latest start first
    pub async fn list_events(
        &self,
        filter: EventFilter,
        today: NaiveDate,
    ) -> Result<Vec<EventView>, PortalError> {
        let mut views: Vec<EventView> = self
            .all()
            .await?
            .into_iter()
            .filter(|e| filter.matches(e, today))
            .map(|e| EventView::on(e, today))
            .collect();
        views.sort_by(|a, b| (b.start, b.event.id).cmp(&(a.start, a.event.id)));
        Ok(views)
    }

    pub async fn running_events(&self, today: NaiveDate) -> Result<Vec<EventView>, PortalError> {
        self.list_events(EventFilter::Only(EventStatus::Running), today)
            .await
    }

    pub async fn calendar(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<CalendarMonth, PortalError> {
        let events = self.all().await?;
        build_calendar(&events, year, month, today)
            .ok_or_else(|| PortalError::validation(format!("Invalid month: {}-{}", year, month)))
    }

    pub async fn calendar_lists(&self, today: NaiveDate) -> Result<CalendarLists, PortalError> {
        Ok(split_calendar_lists(self.all().await?, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;
    use crate::services::test_support::TestContext;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event(id: i64, start: Option<NaiveDate>, deadline: Option<NaiveDate>) -> Event {
        Event {
            id,
            title: format!("Event {}", id),
            kind: EventKind::Seminar,
            description: String::new(),
            date: None,
            start_date: start,
            deadline,
            created_at: Utc::now(),
        }
    }

    fn input(title: &str, start: NaiveDate, deadline: Option<NaiveDate>) -> CreateEventInput {
        CreateEventInput {
            title: title.to_string(),
            start_date: Some(start),
            deadline,
            ..CreateEventInput::default()
        }
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 12), Some(31));
        assert_eq!(days_in_month(2024, 13), None);
    }

    #[test]
    fn test_calendar_grid_covers_ranges() {
        let events = vec![
            event(1, Some(d(2024, 3, 30)), Some(d(2024, 4, 2))),
            event(2, Some(d(2024, 4, 10)), None),
            event(3, None, None),
        ];
        let month = build_calendar(&events, 2024, 4, d(2024, 4, 1)).unwrap();

        assert_eq!(month.name, "April");
        assert_eq!(month.days_in_month, 30);
        // 1 April 2024 was a Monday
        assert_eq!(month.first_weekday, 1);
        assert_eq!(month.days.len(), 30);
        assert_eq!(month.days[0].events.len(), 1);
        assert_eq!(month.days[0].events[0].status, Some(EventStatus::Running));
        assert_eq!(month.days[1].events.len(), 1);
        assert!(month.days[2].events.is_empty());
        assert_eq!(month.days[9].events[0].event.id, 2);
    }

    #[test]
    fn test_calendar_lists_split_and_order() {
        let today = d(2024, 6, 15);
        let lists = split_calendar_lists(
            vec![
                event(1, Some(d(2024, 6, 1)), Some(d(2024, 6, 20))),
                event(2, Some(d(2024, 7, 1)), None),
                event(3, Some(d(2024, 5, 1)), None),
                event(4, Some(d(2024, 1, 1)), None),
                event(5, None, None),
            ],
            today,
        );

        let upcoming: Vec<i64> = lists.upcoming.iter().map(|v| v.event.id).collect();
        let past: Vec<i64> = lists.past.iter().map(|v| v.event.id).collect();
        assert_eq!(upcoming, vec![1, 2]);
        assert_eq!(past, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_publish_and_filter() {
        let ctx = TestContext::new().await;
        let service = ctx.event_service();
        let intern = ctx.intern_actor("Web Manager", "web@x.com").await;
        let today = d(2024, 6, 15);

        service
            .add_event(&intern, input("Running", d(2024, 6, 10), Some(d(2024, 6, 20))))
            .await
            .unwrap();
        service
            .add_event(&intern, input("Upcoming", d(2024, 7, 1), None))
            .await
            .unwrap();
        service
            .add_event(&intern, input("Done", d(2024, 1, 5), None))
            .await
            .unwrap();

        let all = service.list_events(EventFilter::All, today).await.unwrap();
        let titles: Vec<&str> = all.iter().map(|v| v.event.title.as_str()).collect();
        assert_eq!(titles, vec!["Upcoming", "Running", "Done"]);

        let running = service.running_events(today).await.unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].event.title, "Running");
    }

    #[tokio::test]
    async fn test_add_event_requires_title_and_date() {
        let ctx = TestContext::new().await;
        let service = ctx.event_service();
        let admin = ctx.admin_actor().await;

        let missing_date = CreateEventInput {
            title: "No date".to_string(),
            ..CreateEventInput::default()
        };
        assert!(matches!(
            service.add_event(&admin, missing_date).await,
            Err(PortalError::Validation(_))
        ));
        assert!(matches!(
            service.add_event(&admin, input(" ", d(2024, 1, 1), None)).await,
            Err(PortalError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_listing_cache_is_invalidated_on_write() {
        let ctx = TestContext::new().await;
        let service = ctx.event_service();
        let admin = ctx.admin_actor().await;
        let today = d(2024, 6, 15);

        assert!(service.list_events(EventFilter::All, today).await.unwrap().is_empty());

        let created = service
            .add_event(&admin, input("Fresh", d(2024, 6, 15), None))
            .await
            .unwrap();
        assert_eq!(service.list_events(EventFilter::All, today).await.unwrap().len(), 1);

        service.delete_event(&admin, created.id).await.unwrap();
        assert!(service.list_events(EventFilter::All, today).await.unwrap().is_empty());
        assert!(matches!(
            service.delete_event(&admin, created.id).await,
            Err(PortalError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_calendar_rejects_bad_month() {
        let ctx = TestContext::new().await;
        let service = ctx.event_service();
        assert!(service.calendar(2024, 0, d(2024, 1, 1)).await.is_err());
        assert!(service.calendar(2024, 2, d(2024, 1, 1)).await.is_ok());
    }
}
