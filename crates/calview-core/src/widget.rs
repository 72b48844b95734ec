use std::fmt;
use std::future::Future;

use anyhow::bail;
use chrono::{
  DateTime,
  Months,
  Utc
};

use crate::event::CalendarEvent;
use crate::state::ViewState;

pub const LOAD_FAILURE_MESSAGE: &str =
  "Failed to load calendar. Please \
   refresh.";
pub const DEFAULT_WINDOW_MONTHS: u32 = 4;

/// Why the event source could not
/// deliver a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
  Transport(String),
  Status(u16),
  Decode(String)
}

impl fmt::Display for LoadFailure {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::Transport(detail) => {
        write!(
          f,
          "event source unreachable: \
           {detail}"
        )
      }
      | Self::Status(code) => {
        write!(
          f,
          "event source returned HTTP \
           {code}"
        )
      }
      | Self::Decode(detail) => {
        write!(
          f,
          "event source sent an \
           unreadable payload: {detail}"
        )
      }
    }
  }
}

impl std::error::Error for LoadFailure {}

/// Time range requested from the source.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct FetchWindow {
  pub start: DateTime<Utc>,
  pub end:   DateTime<Utc>
}

impl FetchWindow {
  pub fn around(
    anchor: DateTime<Utc>,
    months_before: u32,
    months_after: u32
  ) -> Self {
    Self {
      start: anchor
        .checked_sub_months(Months::new(
          months_before
        ))
        .unwrap_or(anchor),
      end:   anchor
        .checked_add_months(Months::new(
          months_after
        ))
        .unwrap_or(anchor)
    }
  }
}

pub trait EventSource {
  fn fetch_events(
    &self,
    window: &FetchWindow
  ) -> impl Future<
    Output = Result<
      Vec<CalendarEvent>,
      LoadFailure
    >
  >;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
  Idle,
  Loading,
  Ready { events: usize },
  Failed(LoadFailure)
}

/// One widget instance: its view state
/// plus the load lifecycle around it.
///
/// Loads are serialised: a second load
/// is refused while one is in flight,
/// and after a failure the widget stays
/// failed until it is rebuilt.
pub struct Widget {
  view:  ViewState,
  state: LoadState
}

impl Widget {
  pub fn new(view: ViewState) -> Self {
    Self {
      view,
      state: LoadState::Idle
    }
  }

  pub fn load_state(&self) -> &LoadState {
    &self.state
  }

  pub fn is_loading(&self) -> bool {
    self.state == LoadState::Loading
  }

  /// The view state, unless the last
  /// load failed; renderers show
  /// [`LOAD_FAILURE_MESSAGE`] instead.
  pub fn view(&self) -> Option<&ViewState> {
    match self.state {
      | LoadState::Failed(_) => None,
      | _ => Some(&self.view)
    }
  }

  pub fn view_mut(
    &mut self
  ) -> Option<&mut ViewState> {
    match self.state {
      | LoadState::Failed(_) => None,
      | _ => Some(&mut self.view)
    }
  }

  pub fn failure(
    &self
  ) -> Option<&LoadFailure> {
    match &self.state {
      | LoadState::Failed(failure) => {
        Some(failure)
      }
      | _ => None
    }
  }

  pub fn begin_load(
    &mut self
  ) -> anyhow::Result<()> {
    match &self.state {
      | LoadState::Loading => {
        bail!(
          "an event load is already in \
           flight"
        )
      }
      | LoadState::Failed(failure) => {
        bail!(
          "widget failed to load ({failure}); \
           rebuild it to retry"
        )
      }
      | LoadState::Idle
      | LoadState::Ready { .. } => {
        self.state = LoadState::Loading;
        tracing::debug!("event load started");
        Ok(())
      }
    }
  }

  /// Settles the load started by
  /// [`Widget::begin_load`]. Results that
  /// arrive with no load in flight are
  /// refused and leave the state as is.
  pub fn finish_load(
    &mut self,
    result: Result<
      Vec<CalendarEvent>,
      LoadFailure
    >
  ) -> anyhow::Result<()> {
    if self.state != LoadState::Loading {
      tracing::warn!(
        state = ?self.state,
        "ignoring load result with no \
         load in flight"
      );
      bail!(
        "no event load in flight (state: \
         {:?})",
        self.state
      );
    }

    match result {
      | Ok(events) => {
        let count = events.len();
        self.view.replace_events(events);
        self.state =
          LoadState::Ready { events: count };
        tracing::info!(
          events = count,
          "event load finished"
        );
      }
      | Err(failure) => {
        tracing::error!(
          error = %failure,
          "event load failed"
        );
        self.state =
          LoadState::Failed(failure);
      }
    }
    Ok(())
  }

  #[tracing::instrument(skip(self, source))]
  pub async fn load<S: EventSource>(
    &mut self,
    source: &S,
    window: FetchWindow
  ) -> anyhow::Result<usize> {
    self.begin_load()?;
    let result =
      source.fetch_events(&window).await;
    self.finish_load(result)?;
    match &self.state {
      | LoadState::Ready { events } => {
        Ok(*events)
      }
      | LoadState::Failed(failure) => {
        Err(failure.clone().into())
      }
      | other => {
        bail!(
          "unexpected load state after \
           fetch: {other:?}"
        )
      }
    }
  }
}
