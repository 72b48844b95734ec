use std::time::Duration;

use anyhow::{Context, bail};
use calview_core::config::CalendarConfig;
use calview_core::event::decode_events;
use calview_core::{CalendarEvent, EventSource, FetchWindow, LoadFailure};
use chrono::SecondsFormat;
use tracing::{info, instrument, warn};
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Reads single (pre-expanded) events from a Google Calendar v3 compatible
/// `events` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleCalendarSource {
    client: reqwest::Client,
    base_url: Url,
    calendar_id: String,
    api_key: Option<String>,
    max_results: u32,
}

impl GoogleCalendarSource {
    pub fn new(
        base_url: &str,
        calendar_id: &str,
        api_key: Option<String>,
        max_results: u32,
    ) -> anyhow::Result<Self> {
        let calendar_id = calendar_id.trim();
        if calendar_id.is_empty() {
            bail!("calendar id is empty; set source.calendar_id in calview.toml or pass --events");
        }

        let base_url = Url::parse(base_url.trim())
            .with_context(|| format!("invalid calendar base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("calendar base URL cannot carry a path: {base_url}");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed building HTTP client for calendar fetch")?;

        Ok(Self {
            client,
            base_url,
            calendar_id: calendar_id.to_string(),
            api_key,
            max_results,
        })
    }

    pub fn from_config(config: &CalendarConfig) -> anyhow::Result<Self> {
        if config.api_key().is_none() {
            warn!("no API key configured; the calendar must allow anonymous reads");
        }
        Self::new(
            &config.source.base_url,
            &config.source.calendar_id,
            config.api_key(),
            config.source.max_results,
        )
    }

    pub fn events_url(&self, window: &FetchWindow) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["calendars", self.calendar_id.as_str(), "events"]);
        }

        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = self.api_key.as_deref() {
                query.append_pair("key", key);
            }
            query
                .append_pair(
                    "timeMin",
                    &window.start.to_rfc3339_opts(SecondsFormat::Millis, true),
                )
                .append_pair(
                    "timeMax",
                    &window.end.to_rfc3339_opts(SecondsFormat::Millis, true),
                )
                .append_pair("singleEvents", "true")
                .append_pair("orderBy", "startTime")
                .append_pair("maxResults", &self.max_results.to_string());
        }
        url
    }
}

impl EventSource for GoogleCalendarSource {
    #[instrument(skip(self), fields(calendar_id = %self.calendar_id))]
    async fn fetch_events(
        &self,
        window: &FetchWindow,
    ) -> Result<Vec<CalendarEvent>, LoadFailure> {
        let url = self.events_url(window);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| {
                // The URL carries the API key.
                let error = error.without_url();
                warn!(error = %error, "failed requesting calendar events");
                LoadFailure::Transport(error.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "calendar events request returned non-success status");
            return Err(LoadFailure::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|error| LoadFailure::Transport(error.without_url().to_string()))?;

        let events =
            decode_events(&body).map_err(|error| LoadFailure::Decode(error.to_string()))?;

        info!(events = events.len(), "fetched calendar events");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn window() -> FetchWindow {
        FetchWindow {
            start: Utc
                .with_ymd_and_hms(2023, 11, 11, 0, 0, 0)
                .single()
                .expect("valid instant"),
            end: Utc
                .with_ymd_and_hms(2024, 7, 11, 0, 0, 0)
                .single()
                .expect("valid instant"),
        }
    }

    #[test]
    fn builds_events_url_with_encoded_id() {
        let source = GoogleCalendarSource::new(
            "https://www.googleapis.com/calendar/v3",
            "team#1@group.calendar.google.com",
            Some("secret".to_string()),
            250,
        )
        .expect("source");

        let url = source.events_url(&window());
        assert_eq!(
            url.path(),
            "/calendar/v3/calendars/team%231@group.calendar.google.com/events"
        );

        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        let get = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        };
        assert_eq!(get("key").as_deref(), Some("secret"));
        assert_eq!(get("timeMin").as_deref(), Some("2023-11-11T00:00:00.000Z"));
        assert_eq!(get("timeMax").as_deref(), Some("2024-07-11T00:00:00.000Z"));
        assert_eq!(get("singleEvents").as_deref(), Some("true"));
        assert_eq!(get("orderBy").as_deref(), Some("startTime"));
        assert_eq!(get("maxResults").as_deref(), Some("250"));
    }

    #[test]
    fn omits_key_when_unset() {
        let source =
            GoogleCalendarSource::new("http://localhost:9/v3/", "cal", None, 10).expect("source");
        let url = source.events_url(&window());
        assert_eq!(url.path(), "/v3/calendars/cal/events");
        assert!(url.query_pairs().all(|(key, _)| key != "key"));
    }

    #[test]
    fn rejects_blank_calendar_id() {
        assert!(GoogleCalendarSource::new("https://example.com", "  ", None, 250).is_err());
    }
}
