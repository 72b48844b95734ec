use chrono::{
  DateTime,
  FixedOffset,
  NaiveDate,
  NaiveDateTime,
  NaiveTime
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};

const DUE_MARKER: &str = "due";

/// One event as supplied by the event
/// source. Field names follow the
/// Google Calendar v3 wire format.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct CalendarEvent {
  pub id:          String,
  #[serde(rename = "summary", default)]
  pub title:       String,
  pub start:       EventStart,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<String>
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(
  try_from = "WireEventStart",
  into = "WireEventStart"
)]
pub enum EventStart {
  Timed(DateTime<FixedOffset>),
  /// Date only, read as a local
  /// calendar day.
  AllDay(NaiveDate)
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEventStart {
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  date_time: Option<DateTime<FixedOffset>>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  date:      Option<NaiveDate>
}

impl TryFrom<WireEventStart>
  for EventStart
{
  type Error = String;

  fn try_from(
    wire: WireEventStart
  ) -> Result<Self, Self::Error> {
    match (wire.date_time, wire.date) {
      | (Some(date_time), _) => {
        Ok(Self::Timed(date_time))
      }
      | (None, Some(date)) => {
        Ok(Self::AllDay(date))
      }
      | (None, None) => {
        Err(
          "event start carries neither \
           dateTime nor date"
            .to_string()
        )
      }
    }
  }
}

impl From<EventStart>
  for WireEventStart
{
  fn from(start: EventStart) -> Self {
    match start {
      | EventStart::Timed(date_time) => {
        Self {
          date_time: Some(date_time),
          date:      None
        }
      }
      | EventStart::AllDay(date) => {
        Self {
          date_time: None,
          date:      Some(date)
        }
      }
    }
  }
}

impl CalendarEvent {
  pub fn timed(
    id: impl Into<String>,
    title: impl Into<String>,
    start: DateTime<FixedOffset>
  ) -> Self {
    Self {
      id:          id.into(),
      title:       title.into(),
      start:       EventStart::Timed(
        start
      ),
      description: None
    }
  }

  pub fn all_day(
    id: impl Into<String>,
    title: impl Into<String>,
    date: NaiveDate
  ) -> Self {
    Self {
      id:          id.into(),
      title:       title.into(),
      start:       EventStart::AllDay(
        date
      ),
      description: None
    }
  }

  #[must_use]
  pub fn with_description(
    mut self,
    description: impl Into<String>
  ) -> Self {
    self.description =
      Some(description.into());
    self
  }

  /// Title heuristic: any title
  /// containing "due" (any case) is a
  /// deadline.
  pub fn is_due(&self) -> bool {
    self
      .title
      .to_lowercase()
      .contains(DUE_MARKER)
  }

  pub fn is_all_day(&self) -> bool {
    matches!(
      self.start,
      EventStart::AllDay(_)
    )
  }

  /// Wall-clock start in `timezone`;
  /// all-day events start at local
  /// midnight.
  pub fn local_start(
    &self,
    timezone: Tz
  ) -> NaiveDateTime {
    match self.start {
      | EventStart::Timed(date_time) => {
        date_time
          .with_timezone(&timezone)
          .naive_local()
      }
      | EventStart::AllDay(date) => {
        date.and_time(NaiveTime::MIN)
      }
    }
  }

  pub fn local_date(
    &self,
    timezone: Tz
  ) -> NaiveDate {
    self.local_start(timezone).date()
  }

  /// Start time of day for timed events.
  pub fn local_time(
    &self,
    timezone: Tz
  ) -> Option<NaiveTime> {
    match self.start {
      | EventStart::Timed(_) => Some(
        self.local_start(timezone).time()
      ),
      | EventStart::AllDay(_) => None
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventPayload {
  List(Vec<CalendarEvent>),
  Feed {
    #[serde(default)]
    items: Vec<CalendarEvent>
  }
}

/// Decodes either an events feed
/// (`{"items": [...]}`) or a bare array
/// of events, keeping source order.
pub fn decode_events(
  raw: &str
) -> serde_json::Result<Vec<CalendarEvent>>
{
  let payload =
    serde_json::from_str::<EventPayload>(
      raw
    )?;
  Ok(match payload {
    | EventPayload::List(items) => items,
    | EventPayload::Feed { items } => {
      items
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_google_feed() {
    let raw = r#"{
      "kind": "calendar#events",
      "items": [
        {
          "id": "a",
          "summary": "Essay DUE",
          "start": { "date": "2024-03-10" }
        },
        {
          "id": "b",
          "summary": "Standup",
          "description": "Room 4",
          "start": {
            "dateTime": "2024-03-10T23:45:00-05:00",
            "timeZone": "America/Chicago"
          }
        }
      ]
    }"#;

    let events =
      decode_events(raw).expect("decode");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, "a");
    assert!(events[0].is_all_day());
    assert!(events[0].is_due());
    assert!(!events[1].is_due());
    assert_eq!(
      events[1].description.as_deref(),
      Some("Room 4")
    );
  }

  #[test]
  fn feed_without_items_is_empty() {
    let events = decode_events(
      r#"{"kind": "calendar#events"}"#
    )
    .expect("decode");
    assert!(events.is_empty());
  }

  #[test]
  fn rejects_start_without_date() {
    let raw = r#"[{
      "id": "x",
      "summary": "?",
      "start": {}
    }]"#;
    assert!(decode_events(raw).is_err());
  }

  #[test]
  fn timed_start_converts_to_local_day() {
    let start =
      DateTime::parse_from_rfc3339(
        "2024-03-11T02:30:00Z"
      )
      .expect("valid timestamp");
    let event = CalendarEvent::timed(
      "t", "Late", start
    );

    let chicago =
      chrono_tz::America::Chicago;
    assert_eq!(
      event.local_date(chicago),
      NaiveDate::from_ymd_opt(2024, 3, 10)
        .expect("valid date")
    );
    assert_eq!(
      event.local_date(chrono_tz::UTC),
      NaiveDate::from_ymd_opt(2024, 3, 11)
        .expect("valid date")
    );
  }

  #[test]
  fn due_match_is_case_insensitive_substring()
  {
    let day =
      NaiveDate::from_ymd_opt(2024, 1, 1)
        .expect("valid date");
    let titled = |title: &str| {
      CalendarEvent::all_day(
        "e", title, day
      )
    };
    assert!(titled("Lab Due").is_due());
    assert!(
      titled("OVERDUE notice").is_due()
    );
    assert!(!titled("").is_due());
    assert!(!titled("D-u-e").is_due());
  }
}
