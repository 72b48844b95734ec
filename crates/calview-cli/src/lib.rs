pub mod cli;
pub mod file_source;
pub mod google;
pub mod render;

use std::ffi::OsString;
use std::io::{
  self,
  IsTerminal,
  Write
};

use anyhow::{
  Context,
  anyhow
};
use calview_core::datetime::start_of_day_utc;
use calview_core::{
  CalendarConfig,
  FetchWindow,
  FixedClock,
  MonthCursor,
  SystemClock,
  ViewState,
  Widget
};
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::cli::{
  Command,
  GlobalCli
};
use crate::file_source::FileSource;
use crate::google::GoogleCalendarSource;
use crate::render::Renderer;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli = GlobalCli::parse_from(
    raw_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting calview"
  );

  let config = CalendarConfig::load(
    cli.config.as_deref()
  )?;
  debug!(
    loaded_from = ?config.loaded_from,
    "resolved configuration"
  );

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;
  let output = runtime
    .block_on(execute(&cli, &config))?;

  let mut out = io::stdout().lock();
  writeln!(out, "{output}")?;
  Ok(())
}

async fn execute(
  cli: &GlobalCli,
  config: &CalendarConfig
) -> anyhow::Result<String> {
  let timezone = config.timezone();
  let view = match cli.today {
    | Some(today) => {
      ViewState::new(
        vec![],
        timezone,
        FixedClock::new(today)
      )
    }
    | None => {
      ViewState::new(
        vec![],
        timezone,
        SystemClock::new(timezone)
      )
    }
  };

  let anchor = cli
    .today
    .map(start_of_day_utc)
    .unwrap_or_else(Utc::now);
  let window = FetchWindow::around(
    anchor,
    config.window.months_before,
    config.window.months_after
  );

  let mut widget = Widget::new(view);
  let loaded = match &cli.events {
    | Some(path) => {
      widget
        .load(
          &FileSource::new(path),
          window
        )
        .await
    }
    | None => {
      let source =
        GoogleCalendarSource::from_config(
          config
        )?;
      widget.load(&source, window).await
    }
  };
  if let Err(err) = &loaded {
    warn!(
      error = %err,
      "calendar load failed"
    );
  }

  let renderer = Renderer::new(
    io::stdout().is_terminal()
  );
  let Some(view) = widget.view_mut()
  else {
    return Ok(render_failure(
      &renderer,
      &cli.command()
    ));
  };

  render_command(
    &renderer,
    view,
    cli.command()
  )
}

fn render_command(
  renderer: &Renderer,
  view: &mut ViewState,
  command: Command
) -> anyhow::Result<String> {
  let text = match command {
    | Command::Week {
      date,
      mini_shift
    } => {
      if let Some(date) = date {
        view.select_week_containing(date);
        let delta = months_between(
          view.mini_month(),
          MonthCursor::containing(date)
        );
        view.shift_mini_month(delta);
      }
      view.shift_mini_month(mini_shift);
      renderer.weekly(view)
    }
    | Command::Upcoming => {
      renderer.upcoming(view)
    }
    | Command::Month { shift } => {
      view.shift_displayed_month(shift);
      renderer.monthly(view)
    }
    | Command::Day { date } => {
      renderer
        .day_popup(&view.day_popup(date))
    }
    | Command::Event { id } => {
      let details = view
        .event_details(&id)
        .ok_or_else(|| {
          anyhow!("no event with id {id}")
        })?;
      renderer.event_popup(&details)
    }
    | Command::All => {
      [
        renderer.weekly(view),
        renderer.upcoming(view),
        renderer.monthly(view)
      ]
      .join("\n\n")
    }
  };
  Ok(text)
}

/// Each requested view is replaced by
/// the error message.
fn render_failure(
  renderer: &Renderer,
  command: &Command
) -> String {
  let views = match command {
    | Command::All => 3,
    | _ => 1
  };
  vec![renderer.error_state(); views]
    .join("\n\n")
}

fn months_between(
  from: MonthCursor,
  to: MonthCursor
) -> i32 {
  (to.year() - from.year()) * 12
    + to.month0() as i32
    - from.month0() as i32
}
