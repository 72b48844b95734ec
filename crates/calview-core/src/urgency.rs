use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::datetime::days_between;
use crate::event::CalendarEvent;

pub const URGENT_MAX_DAYS: i64 = 2;
pub const SOON_MAX_DAYS: i64 = 7;
pub const LATER_DISPLAY_LIMIT: usize = 8;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Urgency {
  Urgent,
  Soon,
  Later
}

impl Urgency {
  pub fn for_days(days: i64) -> Self {
    if days <= URGENT_MAX_DAYS {
      Self::Urgent
    } else if days <= SOON_MAX_DAYS {
      Self::Soon
    } else {
      Self::Later
    }
  }

  pub fn heading(self) -> &'static str {
    match self {
      | Self::Urgent => "Due Very Soon",
      | Self::Soon => "This Week",
      | Self::Later => "On the Horizon"
    }
  }
}

/// A due event and how many whole days
/// remain until it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown<'a> {
  pub event: &'a CalendarEvent,
  pub date:  NaiveDate,
  pub days:  i64
}

impl Countdown<'_> {
  pub fn day_label(
    &self
  ) -> &'static str {
    if self.days == 1 {
      "day"
    } else {
      "days"
    }
  }
}

#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct UrgencyBuckets<'a> {
  urgent: Vec<Countdown<'a>>,
  soon:   Vec<Countdown<'a>>,
  later:  Vec<Countdown<'a>>
}

impl<'a> UrgencyBuckets<'a> {
  pub fn urgent(
    &self
  ) -> &[Countdown<'a>] {
    &self.urgent
  }

  pub fn soon(&self) -> &[Countdown<'a>] {
    &self.soon
  }

  /// Every later entry, including those
  /// past the display cap.
  pub fn later(
    &self
  ) -> &[Countdown<'a>] {
    &self.later
  }

  pub fn later_for_display(
    &self
  ) -> &[Countdown<'a>] {
    let shown = self
      .later
      .len()
      .min(LATER_DISPLAY_LIMIT);
    &self.later[..shown]
  }

  pub fn bucket(
    &self,
    urgency: Urgency
  ) -> &[Countdown<'a>] {
    match urgency {
      | Urgency::Urgent => self.urgent(),
      | Urgency::Soon => self.soon(),
      | Urgency::Later => {
        self.later_for_display()
      }
    }
  }

  pub fn len(&self) -> usize {
    self.urgent.len()
      + self.soon.len()
      + self.later.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Splits upcoming due events into
/// urgent, soon and later.
///
/// Only due events on or after `today`
/// count. Day counts are taken between
/// local calendar days, so time of day
/// never pushes an event into the next
/// tier. Each bucket is ordered by local
/// start.
pub fn classify<'a>(
  events: &'a [CalendarEvent],
  today: NaiveDate,
  timezone: Tz
) -> UrgencyBuckets<'a> {
  let mut upcoming = events
    .iter()
    .filter(|event| event.is_due())
    .map(|event| {
      (
        event.local_start(timezone),
        event
      )
    })
    .filter(|(start, _)| {
      start.date() >= today
    })
    .collect::<Vec<_>>();

  upcoming.sort_by_key(|(start, _)| *start);

  let mut buckets =
    UrgencyBuckets::default();
  for (start, event) in upcoming {
    let date = start.date();
    let days = days_between(today, date);
    let countdown =
      Countdown { event, date, days };
    match Urgency::for_days(days) {
      | Urgency::Urgent => {
        buckets.urgent.push(countdown)
      }
      | Urgency::Soon => {
        buckets.soon.push(countdown)
      }
      | Urgency::Later => {
        buckets.later.push(countdown)
      }
    }
  }

  tracing::debug!(
    %today,
    urgent = buckets.urgent.len(),
    soon = buckets.soon.len(),
    later = buckets.later.len(),
    "classified due events"
  );
  buckets
}
