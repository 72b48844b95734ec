use chrono::{
  DateTime,
  Datelike,
  Duration,
  Months,
  NaiveDate,
  NaiveTime,
  Utc
};
use chrono_tz::Tz;

pub const TIMEZONE_ENV_VAR: &str =
  "CALVIEW_TIMEZONE";
const DEFAULT_TIMEZONE: &str = "UTC";

pub const DAYS_PER_WEEK: usize = 7;
const MONTHS_PER_YEAR: i64 = 12;

/// Source of "today" for a widget.
///
/// Everything that compares against the
/// current day goes through this seam so
/// the engine can be driven with a pinned
/// date in tests and in the CLI.
pub trait Clock {
  fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
  timezone: Tz
}

impl SystemClock {
  pub fn new(timezone: Tz) -> Self {
    Self { timezone }
  }
}

impl Clock for SystemClock {
  fn today(&self) -> NaiveDate {
    Utc::now()
      .with_timezone(&self.timezone)
      .date_naive()
  }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
  today: NaiveDate
}

impl FixedClock {
  pub fn new(today: NaiveDate) -> Self {
    Self { today }
  }
}

impl Clock for FixedClock {
  fn today(&self) -> NaiveDate {
    self.today
  }
}

/// A (year, zero-based month) pair.
///
/// Construction folds any month offset
/// into 0..=11, carrying into the year,
/// so a cursor never holds an invalid
/// month. Years saturate one short of
/// chrono's limits so the neighbouring
/// months always exist.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct MonthCursor {
  year:   i32,
  month0: u32
}

impl MonthCursor {
  #[must_use]
  pub fn new(
    year: i32,
    month0: i32
  ) -> Self {
    let (min_year, max_year) =
      supported_years();
    let total = i64::from(year)
      * MONTHS_PER_YEAR
      + i64::from(month0);
    let year =
      total.div_euclid(MONTHS_PER_YEAR);

    if year < i64::from(min_year) {
      return Self {
        year:   min_year,
        month0: 0
      };
    }
    if year > i64::from(max_year) {
      return Self {
        year:   max_year,
        month0: 11
      };
    }

    let month0 = u32::try_from(
      total.rem_euclid(MONTHS_PER_YEAR)
    )
    .unwrap_or(0);
    Self {
      year: i32::try_from(year)
        .unwrap_or(max_year),
      month0
    }
  }

  #[must_use]
  pub fn containing(
    date: NaiveDate
  ) -> Self {
    Self::new(
      date.year(),
      date.month0() as i32
    )
  }

  pub fn year(self) -> i32 {
    self.year
  }

  /// Zero-based month index (0 =
  /// January).
  pub fn month0(self) -> u32 {
    self.month0
  }

  /// One-based month number, as chrono
  /// expects it.
  pub fn month(self) -> u32 {
    self.month0 + 1
  }

  #[must_use]
  pub fn shifted(
    self,
    delta: i32
  ) -> Self {
    Self::new(
      self.year,
      (self.month0 as i32)
        .saturating_add(delta)
    )
  }

  pub fn first_day(self) -> NaiveDate {
    first_day_of_month(
      self.year,
      self.month()
    )
  }

  pub fn last_day(self) -> NaiveDate {
    let first = self.first_day();
    first
      .checked_add_months(Months::new(1))
      .map(|next| add_days(next, -1))
      .unwrap_or(first)
  }

  pub fn days_in_month(self) -> u32 {
    self.last_day().day()
  }

  /// The given day of this month; out of
  /// range days fall back to the 1st.
  pub fn day(
    self,
    day: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(
      self.year,
      self.month(),
      day
    )
    .unwrap_or_else(|| self.first_day())
  }

  pub fn contains(
    self,
    date: NaiveDate
  ) -> bool {
    date.year() == self.year
      && date.month0() == self.month0
  }
}

/// Inclusive year range a cursor may
/// hold.
fn supported_years() -> (i32, i32) {
  (
    NaiveDate::MIN.year() + 1,
    NaiveDate::MAX.year() - 1
  )
}

pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

/// Weekday with Sunday as 0 and
/// Saturday as 6.
pub fn weekday_index(
  date: NaiveDate
) -> u32 {
  date
    .weekday()
    .num_days_from_sunday()
}

/// The Sunday on or before `date`.
pub fn week_start_sunday(
  date: NaiveDate
) -> NaiveDate {
  add_days(
    date,
    -i64::from(weekday_index(date))
  )
}

pub fn week_days(
  week_start: NaiveDate
) -> [NaiveDate; DAYS_PER_WEEK] {
  let mut days =
    [week_start; DAYS_PER_WEEK];
  for (offset, slot) in
    days.iter_mut().enumerate()
  {
    *slot = add_days(
      week_start,
      offset as i64
    );
  }
  days
}

/// Whole days from `today` to `date`.
pub fn days_between(
  today: NaiveDate,
  date: NaiveDate
) -> i64 {
  date
    .signed_duration_since(today)
    .num_days()
}

/// "Mar 10"
pub fn format_short(
  date: NaiveDate
) -> String {
  date.format("%b %-d").to_string()
}

/// "Sunday, Mar 10"
pub fn format_full(
  date: NaiveDate
) -> String {
  date.format("%A, %b %-d").to_string()
}

/// "3:30 PM"
pub fn format_clock(
  time: NaiveTime
) -> String {
  time.format("%-I:%M %p").to_string()
}

/// "Mar 10 – Mar 16"
pub fn week_range_label(
  week_start: NaiveDate
) -> String {
  format!(
    "{} \u{2013} {}",
    format_short(week_start),
    format_short(add_days(
      week_start,
      DAYS_PER_WEEK as i64 - 1
    ))
  )
}

/// "March 2024"
pub fn month_title(
  cursor: MonthCursor
) -> String {
  cursor
    .first_day()
    .format("%B %Y")
    .to_string()
}

pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(
        &raw,
        TIMEZONE_ENV_VAR
      )
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "calview.toml")
  {
    return tz;
  }

  parse_timezone(
    DEFAULT_TIMEZONE,
    "calendar-default"
  )
  .unwrap_or(chrono_tz::UTC)
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(error) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %error,
        "invalid timezone id"
      );
      None
    }
  }
}

/// Midnight UTC on the given day; used
/// to anchor fetch windows when the
/// clock is pinned.
pub fn start_of_day_utc(
  date: NaiveDate
) -> DateTime<Utc> {
  date
    .and_time(NaiveTime::MIN)
    .and_utc()
}
