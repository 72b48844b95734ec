use std::fs;
use std::path::{Path, PathBuf};

use calview_core::event::decode_events;
use calview_core::{CalendarEvent, EventSource, FetchWindow, LoadFailure};
use tracing::{info, instrument};

/// Events exported to disk in the same shape the calendar API returns.
/// The whole file is loaded regardless of the requested window.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl EventSource for FileSource {
    #[instrument(skip(self, _window), fields(file = %self.path.display()))]
    async fn fetch_events(
        &self,
        _window: &FetchWindow,
    ) -> Result<Vec<CalendarEvent>, LoadFailure> {
        let raw = fs::read_to_string(&self.path).map_err(|error| {
            LoadFailure::Transport(format!("failed to read {}: {error}", self.path.display()))
        })?;

        let events = decode_events(&raw)
            .map_err(|error| LoadFailure::Decode(format!("{}: {error}", self.path.display())))?;

        info!(events = events.len(), "loaded events from file");
        Ok(events)
    }
}
