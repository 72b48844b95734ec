use std::collections::{
  BTreeMap,
  HashMap
};

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::event::CalendarEvent;

/// Events grouped by local calendar day.
///
/// Built fresh from the loaded collection
/// whenever a view needs it; within a day
/// events keep the order the source
/// delivered them in.
#[derive(Debug, Clone, Default)]
pub struct EventIndex<'a> {
  by_day: BTreeMap<
    NaiveDate,
    Vec<&'a CalendarEvent>
  >,
  by_id:  HashMap<
    &'a str,
    &'a CalendarEvent
  >
}

impl<'a> EventIndex<'a> {
  pub fn build(
    events: &'a [CalendarEvent],
    timezone: Tz
  ) -> Self {
    let mut index = Self::default();
    for event in events {
      index
        .by_day
        .entry(event.local_date(timezone))
        .or_default()
        .push(event);
      index
        .by_id
        .entry(event.id.as_str())
        .or_insert(event);
    }

    tracing::debug!(
      events = events.len(),
      days = index.by_day.len(),
      "indexed events by day"
    );
    index
  }

  pub fn events_on(
    &self,
    date: NaiveDate
  ) -> &[&'a CalendarEvent] {
    self
      .by_day
      .get(&date)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn has_events_on(
    &self,
    date: NaiveDate
  ) -> bool {
    !self.events_on(date).is_empty()
  }

  pub fn has_due_on(
    &self,
    date: NaiveDate
  ) -> bool {
    self
      .events_on(date)
      .iter()
      .any(|event| event.is_due())
  }

  /// First event with this id, in source
  /// order.
  pub fn find(
    &self,
    id: &str
  ) -> Option<&'a CalendarEvent> {
    self.by_id.get(id).copied()
  }
}

pub fn index_by_day(
  events: &[CalendarEvent],
  timezone: Tz
) -> EventIndex<'_> {
  EventIndex::build(events, timezone)
}

#[cfg(test)]
mod tests {
  use chrono::DateTime;

  use super::*;

  fn ymd(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn ids<'a>(
    events: &[&'a CalendarEvent]
  ) -> Vec<&'a str> {
    events
      .iter()
      .map(|event| event.id.as_str())
      .collect()
  }

  #[test]
  fn groups_all_day_event_on_its_date() {
    let events =
      vec![CalendarEvent::all_day(
        "a",
        "Field trip",
        ymd(2024, 3, 10)
      )];
    let index = index_by_day(
      &events,
      chrono_tz::UTC
    );

    let on_day =
      index.events_on(ymd(2024, 3, 10));
    assert_eq!(on_day.len(), 1);
    assert_eq!(on_day[0].id, "a");
    assert!(
      index
        .events_on(ymd(2024, 3, 11))
        .is_empty()
    );
  }

  #[test]
  fn timed_late_evening_shares_day_with_all_day()
  {
    let late =
      DateTime::parse_from_rfc3339(
        "2024-03-10T23:45:00-05:00"
      )
      .expect("valid timestamp");
    let events = vec![
      CalendarEvent::timed(
        "late", "Call", late
      ),
      CalendarEvent::all_day(
        "allday",
        "Holiday",
        ymd(2024, 3, 10)
      ),
    ];
    let index = index_by_day(
      &events,
      chrono_tz::America::Chicago
    );

    assert_eq!(
      ids(
        index.events_on(ymd(2024, 3, 10))
      ),
      vec!["late", "allday"]
    );
  }

  #[test]
  fn keeps_source_order_without_resorting()
  {
    let day = ymd(2024, 5, 1);
    let events = vec![
      CalendarEvent::all_day(
        "z", "Zeta", day
      ),
      CalendarEvent::all_day(
        "a", "Alpha", day
      ),
      CalendarEvent::all_day(
        "m", "Mu", day
      ),
    ];
    let index = index_by_day(
      &events,
      chrono_tz::UTC
    );
    assert_eq!(
      ids(index.events_on(day)),
      vec!["z", "a", "m"]
    );
  }

  #[test]
  fn finds_events_and_due_days() {
    let day = ymd(2024, 5, 1);
    let events = vec![
      CalendarEvent::all_day(
        "x", "Lunch", day
      ),
      CalendarEvent::all_day(
        "y",
        "Report due",
        ymd(2024, 5, 2)
      ),
      CalendarEvent::all_day(
        "x",
        "Duplicate id",
        ymd(2024, 5, 3)
      ),
    ];
    let index = index_by_day(
      &events,
      chrono_tz::UTC
    );

    assert_eq!(
      index
        .find("y")
        .map(|e| e.title.as_str()),
      Some("Report due")
    );
    assert_eq!(
      index
        .find("x")
        .map(|e| e.title.as_str()),
      Some("Lunch")
    );
    assert!(
      index.find("missing").is_none()
    );
    assert!(!index.has_due_on(day));
    assert!(
      index.has_due_on(ymd(2024, 5, 2))
    );
  }
}
