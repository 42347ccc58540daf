//! Event model
//!
//! Events carry up to three dates. `date` is the legacy single-day field,
//! `start_date`/`deadline` describe a range. The effective range is:
//!
//! - start = `start_date`, else `date`
//! - end   = `deadline`, else `start_date`, else `date`
//!
//! Status is derived per day, never stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub kind: EventKind,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// First day of the event
    pub fn start(&self) -> Option<NaiveDate> {
        self.start_date.or(self.date)
    }

    /// Last day of the event (inclusive)
    pub fn end(&self) -> Option<NaiveDate> {
        self.deadline.or(self.start_date).or(self.date)
    }

    /// Status of the event as seen on `today`.
    ///
    /// Returns `None` for events without any date.
    pub fn status_on(&self, today: NaiveDate) -> Option<EventStatus> {
        let start = self.start()?;
        let end = self.end().unwrap_or(start);

        if today < start {
            Some(EventStatus::Upcoming)
        } else if today <= end {
            Some(EventStatus::Running)
        } else {
            Some(EventStatus::Completed)
        }
    }

    /// Whether the event's range includes `day`
    pub fn covers(&self, day: NaiveDate) -> bool {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => start <= day && day <= end,
            _ => false,
        }
    }
}

string_enum! {
    pub enum EventKind {
        Workshop => "Workshop",
        Hackathon => "Hackathon",
        Seminar => "Seminar",
        Placement => "Placement",
        Other => "Other",
    }
}

impl Default for EventKind {
    fn default() -> Self {
        Self::Other
    }
}

string_enum! {
    pub enum EventStatus {
        Running => "running",
        Upcoming => "upcoming",
        Completed => "completed",
    }
}

/// Filter for the public activities page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    /// Every dated event
    #[default]
    All,
    Only(EventStatus),
}

impl EventFilter {
    pub fn parse(value: Option<&str>) -> Result<Self, super::ParseEnumError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::All),
            Some(v) if v.eq_ignore_ascii_case("all") => Ok(Self::All),
            Some(v) => v.parse().map(Self::Only),
        }
    }

    /// Undated events never match, not even `All`.
    pub fn matches(&self, event: &Event, today: NaiveDate) -> bool {
        match (self, event.status_on(today)) {
            (_, None) => false,
            (Self::All, Some(_)) => true,
            (Self::Only(wanted), Some(status)) => *wanted == status,
        }
    }
}

/// Input for publishing an event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEventInput {
    pub title: String,
    #[serde(default, alias = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub description: String,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event(date: Option<NaiveDate>, start: Option<NaiveDate>, deadline: Option<NaiveDate>) -> Event {
        Event {
            id: 1,
            title: "CRT Week".to_string(),
            kind: EventKind::Workshop,
            description: String::new(),
            date,
            start_date: start,
            deadline,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_for_range() {
        let e = event(None, Some(d(2024, 10, 20)), Some(d(2024, 10, 25)));

        assert_eq!(e.status_on(d(2024, 10, 19)), Some(EventStatus::Upcoming));
        assert_eq!(e.status_on(d(2024, 10, 20)), Some(EventStatus::Running));
        assert_eq!(e.status_on(d(2024, 10, 25)), Some(EventStatus::Running));
        assert_eq!(e.status_on(d(2024, 10, 26)), Some(EventStatus::Completed));
    }

    #[test]
    fn test_single_day_event_uses_legacy_date() {
        let e = event(Some(d(2024, 3, 1)), None, None);

        assert_eq!(e.start(), Some(d(2024, 3, 1)));
        assert_eq!(e.end(), Some(d(2024, 3, 1)));
        assert_eq!(e.status_on(d(2024, 3, 1)), Some(EventStatus::Running));
        assert_eq!(e.status_on(d(2024, 3, 2)), Some(EventStatus::Completed));
    }

    #[test]
    fn test_start_date_wins_over_date() {
        let e = event(Some(d(2024, 1, 1)), Some(d(2024, 2, 1)), None);
        assert_eq!(e.start(), Some(d(2024, 2, 1)));
        assert_eq!(e.end(), Some(d(2024, 2, 1)));
    }

    #[test]
    fn test_undated_event_has_no_status() {
        let e = event(None, None, Some(d(2024, 5, 5)));
        assert_eq!(e.status_on(d(2024, 5, 1)), None);
        assert!(!EventFilter::All.matches(&e, d(2024, 5, 1)));
        assert!(!e.covers(d(2024, 5, 5)));
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(EventFilter::parse(Some("all")).unwrap(), EventFilter::All);
        assert_eq!(
            EventFilter::parse(Some("Running")).unwrap(),
            EventFilter::Only(EventStatus::Running)
        );
        assert!(EventFilter::parse(Some("past")).is_err());
    }

    #[test]
    fn test_create_input_accepts_type_alias() {
        let input: CreateEventInput =
            serde_json::from_str(r#"{"title":"Hack","type":"hackathon","date":"2024-09-01"}"#).unwrap();
        assert_eq!(input.kind, EventKind::Hackathon);
        assert_eq!(input.date, Some(d(2024, 9, 1)));
    }

    proptest! {
        /// Exactly one status holds for any dated event, and it agrees with `covers`.
        #[test]
        fn prop_status_partitions_days(
            start_off in 0i64..400,
            len in 0i64..30,
            today_off in 0i64..450,
        ) {
            let base = d(2024, 1, 1);
            let start = base + chrono::Duration::days(start_off);
            let end = start + chrono::Duration::days(len);
            let today = base + chrono::Duration::days(today_off);
            let e = event(None, Some(start), Some(end));

            let status = e.status_on(today).unwrap();
            prop_assert_eq!(status == EventStatus::Running, e.covers(today));
            prop_assert_eq!(status == EventStatus::Upcoming, today < start);
            prop_assert_eq!(status == EventStatus::Completed, today > end);
        }
    }
}
