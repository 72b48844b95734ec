use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "calview",
    version,
    about = "Weekly, countdown and monthly views of a calendar feed"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file; defaults to ./calview.toml or the user config dir.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Read events from a JSON file instead of the calendar API.
    #[arg(long = "events", global = true)]
    pub events: Option<PathBuf>,

    /// Pin "today" (YYYY-MM-DD).
    #[arg(long = "today", global = true)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mini month plus the expanded week.
    Week {
        /// Select the week containing this date.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Move the mini month by this many months.
        #[arg(long = "mini-shift", default_value_t = 0, allow_negative_numbers = true)]
        mini_shift: i32,
    },
    /// Countdown to upcoming due events.
    Upcoming,
    /// Full month grid.
    Month {
        /// Months away from the current one.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        shift: i32,
    },
    /// Every event on one day.
    Day { date: NaiveDate },
    /// Details of one event.
    Event { id: String },
    /// Week, countdown and month views in order.
    All,
}

impl GlobalCli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::All)
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
