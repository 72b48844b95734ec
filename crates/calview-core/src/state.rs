use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::datetime::{
  Clock,
  DAYS_PER_WEEK,
  MonthCursor,
  add_days,
  format_clock,
  format_full,
  week_days,
  week_range_label,
  week_start_sunday
};
use crate::event::CalendarEvent;
use crate::grid::{
  MonthGrid,
  build_month_grid
};
use crate::index::EventIndex;
use crate::urgency::{
  UrgencyBuckets,
  classify
};

/// Chips shown in a month cell before
/// the rest collapse into "+N more".
pub const MAX_EVENTS_PER_DAY: usize = 3;

const ALL_DAY_LABEL: &str = "All day";
const NO_DESCRIPTION: &str =
  "No description";

/// One day of the expanded week strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekDay<'a> {
  pub date:     NaiveDate,
  pub events:   Vec<&'a CalendarEvent>,
  pub is_today: bool,
  pub has_due:  bool
}

/// What fits in a month cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPreview<'a> {
  pub shown:  Vec<&'a CalendarEvent>,
  pub hidden: usize
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayPopup<'a> {
  pub title:  String,
  pub events: Vec<&'a CalendarEvent>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
  pub title:       String,
  pub when:        String,
  pub description: String,
  pub is_due:      bool
}

/// Navigation and event state for one
/// widget instance.
///
/// The three cursors move independently:
/// the week selection, the mini month
/// beside it, and the full month view
/// never read or write each other.
pub struct ViewState {
  events:              Vec<CalendarEvent>,
  timezone:            Tz,
  clock:               Box<dyn Clock>,
  selected_week_start: NaiveDate,
  mini_month:          MonthCursor,
  displayed_month:     MonthCursor
}

impl ViewState {
  pub fn new(
    events: Vec<CalendarEvent>,
    timezone: Tz,
    clock: impl Clock + 'static
  ) -> Self {
    let today = clock.today();
    tracing::debug!(
      %today,
      %timezone,
      events = events.len(),
      "creating view state"
    );
    Self {
      events,
      timezone,
      clock: Box::new(clock),
      selected_week_start:
        week_start_sunday(today),
      mini_month: MonthCursor::containing(
        today
      ),
      displayed_month:
        MonthCursor::containing(today)
    }
  }

  /// Swaps in a freshly loaded collection.
  /// Cursors are left where they are.
  pub fn replace_events(
    &mut self,
    events: Vec<CalendarEvent>
  ) {
    tracing::info!(
      previous = self.events.len(),
      loaded = events.len(),
      "replacing event collection"
    );
    self.events = events;
  }

  pub fn events(&self) -> &[CalendarEvent] {
    &self.events
  }

  pub fn timezone(&self) -> Tz {
    self.timezone
  }

  pub fn today(&self) -> NaiveDate {
    self.clock.today()
  }

  pub fn selected_week_start(
    &self
  ) -> NaiveDate {
    self.selected_week_start
  }

  pub fn mini_month(&self) -> MonthCursor {
    self.mini_month
  }

  pub fn displayed_month(
    &self
  ) -> MonthCursor {
    self.displayed_month
  }

  pub fn select_week_containing(
    &mut self,
    date: NaiveDate
  ) {
    self.selected_week_start =
      week_start_sunday(date);
    tracing::debug!(
      %date,
      week_start = %self.selected_week_start,
      "selected week"
    );
  }

  pub fn shift_mini_month(
    &mut self,
    delta: i32
  ) {
    self.mini_month =
      self.mini_month.shifted(delta);
    tracing::debug!(
      delta,
      year = self.mini_month.year(),
      month0 = self.mini_month.month0(),
      "shifted mini month"
    );
  }

  pub fn shift_displayed_month(
    &mut self,
    delta: i32
  ) {
    self.displayed_month =
      self.displayed_month.shifted(delta);
    tracing::debug!(
      delta,
      year = self.displayed_month.year(),
      month0 = self.displayed_month.month0(),
      "shifted displayed month"
    );
  }

  pub fn reset_displayed_month_to_today(
    &mut self
  ) {
    self.displayed_month =
      MonthCursor::containing(self.today());
  }

  pub fn is_in_selected_week(
    &self,
    date: NaiveDate
  ) -> bool {
    let end = add_days(
      self.selected_week_start,
      DAYS_PER_WEEK as i64 - 1
    );
    date >= self.selected_week_start
      && date <= end
  }

  pub fn is_today(
    &self,
    date: NaiveDate
  ) -> bool {
    date == self.today()
  }

  pub fn is_past(
    &self,
    date: NaiveDate
  ) -> bool {
    date < self.today()
  }

  pub fn index(&self) -> EventIndex<'_> {
    EventIndex::build(
      &self.events,
      self.timezone
    )
  }

  pub fn month_grid(
    &self,
    cursor: MonthCursor
  ) -> MonthGrid {
    build_month_grid(cursor)
  }

  pub fn mini_month_grid(&self) -> MonthGrid {
    build_month_grid(self.mini_month)
  }

  pub fn displayed_month_grid(
    &self
  ) -> MonthGrid {
    build_month_grid(self.displayed_month)
  }

  pub fn events_for_day(
    &self,
    date: NaiveDate
  ) -> Vec<&CalendarEvent> {
    self.index().events_on(date).to_vec()
  }

  pub fn selected_week_days(
    &self
  ) -> Vec<WeekDay<'_>> {
    let index = self.index();
    let today = self.today();
    week_days(self.selected_week_start)
      .into_iter()
      .map(|date| {
        WeekDay {
          date,
          events: index
            .events_on(date)
            .to_vec(),
          is_today: date == today,
          has_due: index.has_due_on(date)
        }
      })
      .collect()
  }

  pub fn selected_week_label(
    &self
  ) -> String {
    week_range_label(
      self.selected_week_start
    )
  }

  pub fn urgency_buckets(
    &self
  ) -> UrgencyBuckets<'_> {
    classify(
      &self.events,
      self.today(),
      self.timezone
    )
  }

  pub fn day_preview(
    &self,
    date: NaiveDate
  ) -> DayPreview<'_> {
    let events = self.events_for_day(date);
    let hidden = events
      .len()
      .saturating_sub(MAX_EVENTS_PER_DAY);
    DayPreview {
      shown: events
        .into_iter()
        .take(MAX_EVENTS_PER_DAY)
        .collect(),
      hidden
    }
  }

  pub fn day_popup(
    &self,
    date: NaiveDate
  ) -> DayPopup<'_> {
    DayPopup {
      title:  format_full(date),
      events: self.events_for_day(date)
    }
  }

  pub fn find_event(
    &self,
    id: &str
  ) -> Option<&CalendarEvent> {
    self.index().find(id)
  }

  pub fn event_details(
    &self,
    id: &str
  ) -> Option<EventDetails> {
    let event = self.find_event(id)?;
    let date =
      event.local_date(self.timezone);
    let time = event
      .local_time(self.timezone)
      .map(format_clock)
      .unwrap_or_else(|| {
        ALL_DAY_LABEL.to_string()
      });
    let description = event
      .description
      .as_deref()
      .map(str::trim)
      .filter(|text| !text.is_empty())
      .unwrap_or(NO_DESCRIPTION)
      .to_string();

    Some(EventDetails {
      title: event.title.clone(),
      when: format!(
        "{} \u{b7} {}",
        format_full(date),
        time
      ),
      description,
      is_due: event.is_due()
    })
  }
}
