pub mod config;
pub mod datetime;
pub mod event;
pub mod grid;
pub mod index;
pub mod state;
pub mod urgency;
pub mod widget;

pub use config::CalendarConfig;
pub use datetime::{
  Clock,
  FixedClock,
  MonthCursor,
  SystemClock
};
pub use event::{
  CalendarEvent,
  EventStart
};
pub use grid::{
  GridCell,
  MonthGrid,
  build_month_grid
};
pub use index::{
  EventIndex,
  index_by_day
};
pub use state::ViewState;
pub use urgency::{
  Countdown,
  Urgency,
  UrgencyBuckets,
  classify
};
pub use widget::{
  EventSource,
  FetchWindow,
  LoadFailure,
  LoadState,
  Widget
};
