use chrono::{
  Datelike,
  NaiveDate
};

use crate::datetime::{
  DAYS_PER_WEEK,
  MonthCursor,
  add_days,
  weekday_index
};

pub const GRID_ROWS: usize = 6;
pub const GRID_CELLS: usize =
  GRID_ROWS * DAYS_PER_WEEK;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct GridCell {
  pub date:             NaiveDate,
  pub in_current_month: bool
}

impl GridCell {
  pub fn day(&self) -> u32 {
    self.date.day()
  }
}

/// A fixed 6x7 month layout, Sunday
/// first, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
  cursor: MonthCursor,
  cells:  Vec<GridCell>
}

impl MonthGrid {
  pub fn cursor(&self) -> MonthCursor {
    self.cursor
  }

  pub fn cells(&self) -> &[GridCell] {
    &self.cells
  }

  pub fn rows(
    &self
  ) -> impl Iterator<Item = &[GridCell]>
  {
    self.cells.chunks(DAYS_PER_WEEK)
  }

  /// Zero-based row and column.
  pub fn cell(
    &self,
    row: usize,
    col: usize
  ) -> Option<&GridCell> {
    if col >= DAYS_PER_WEEK {
      return None;
    }
    self
      .cells
      .get(row * DAYS_PER_WEEK + col)
  }

  pub fn current_month_cells(
    &self
  ) -> impl Iterator<Item = &GridCell> {
    self
      .cells
      .iter()
      .filter(|cell| cell.in_current_month)
  }

  pub fn first_date(
    &self
  ) -> Option<NaiveDate> {
    self.cells.first().map(|c| c.date)
  }

  pub fn last_date(
    &self
  ) -> Option<NaiveDate> {
    self.cells.last().map(|c| c.date)
  }
}

/// Lays out `cursor`'s month as 42
/// cells. Leading cells repeat the tail
/// of the previous month, trailing cells
/// the head of the next; six rows are
/// always produced so the layout height
/// stays fixed.
pub fn build_month_grid(
  cursor: MonthCursor
) -> MonthGrid {
  let first_day = cursor.first_day();
  let first_weekday =
    i64::from(weekday_index(first_day));
  let days_in_month =
    cursor.days_in_month();

  // Cell `index` is day
  // `index - first_weekday + 1` of the
  // month, counted through into the
  // neighbouring months.
  let cells = (0..GRID_CELLS)
    .map(|index| {
      let date = add_days(
        first_day,
        index as i64 - first_weekday
      );
      GridCell {
        date,
        in_current_month: cursor
          .contains(date)
      }
    })
    .collect::<Vec<_>>();

  tracing::trace!(
    year = cursor.year(),
    month0 = cursor.month0(),
    first_weekday,
    days_in_month,
    "built month grid"
  );

  MonthGrid { cursor, cells }
}
