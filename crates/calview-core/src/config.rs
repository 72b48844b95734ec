use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::datetime::resolve_timezone;
use crate::widget::DEFAULT_WINDOW_MONTHS;

pub const CONFIG_FILE_NAME: &str =
  "calview.toml";
pub const CONFIG_ENV_VAR: &str =
  "CALVIEW_CONFIG";
pub const API_KEY_ENV_VAR: &str =
  "CALVIEW_API_KEY";
pub const DEFAULT_BASE_URL: &str =
  "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_MAX_RESULTS: u32 = 250;

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_max_results() -> u32 {
  DEFAULT_MAX_RESULTS
}

fn default_window_months() -> u32 {
  DEFAULT_WINDOW_MONTHS
}

#[derive(
  Debug, Clone, Default, Deserialize,
)]
pub struct CalendarConfig {
  #[serde(default)]
  pub timezone: Option<String>,
  #[serde(default)]
  pub source:   SourceConfig,
  #[serde(default)]
  pub window:   WindowConfig,
  #[serde(skip)]
  pub loaded_from: Option<PathBuf>
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
  #[serde(default)]
  pub calendar_id: String,
  #[serde(default)]
  pub api_key:     Option<String>,
  #[serde(default = "default_base_url")]
  pub base_url:    String,
  #[serde(
    default = "default_max_results"
  )]
  pub max_results: u32
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
  #[serde(
    default = "default_window_months"
  )]
  pub months_before: u32,
  #[serde(
    default = "default_window_months"
  )]
  pub months_after:  u32
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      calendar_id: String::new(),
      api_key:     None,
      base_url:    default_base_url(),
      max_results: default_max_results()
    }
  }
}

impl Default for WindowConfig {
  fn default() -> Self {
    Self {
      months_before:
        default_window_months(),
      months_after:
        default_window_months()
    }
  }
}

impl CalendarConfig {
  /// Loads the first config file found:
  /// the explicit path, then
  /// `$CALVIEW_CONFIG`, then
  /// `./calview.toml`, then the user
  /// config dir. An explicit path that
  /// does not exist is an error; a
  /// missing default file is not.
  #[tracing::instrument]
  pub fn load(
    path_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    if let Some(path) = path_override {
      return Self::load_file(path);
    }

    match resolve_config_path() {
      | Some(path) => {
        Self::load_file(&path)
      }
      | None => {
        warn!(
          "no calview.toml found; using \
           defaults"
        );
        Ok(Self::default())
      }
    }
  }

  pub fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let raw = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut config = Self::parse(&raw)
      .with_context(|| {
        format!(
          "failed to parse {}",
          path.display()
        )
      })?;
    config.loaded_from =
      Some(path.to_path_buf());
    info!(
      file = %path.display(),
      calendar_id = %config.source.calendar_id,
      timezone = ?config.timezone,
      "loaded calendar config"
    );
    Ok(config)
  }

  pub fn parse(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut config =
      toml::from_str::<Self>(raw)
        .context("invalid calendar config")?;
    config.sanitize();
    Ok(config)
  }

  fn sanitize(&mut self) {
    self.source.calendar_id = self
      .source
      .calendar_id
      .trim()
      .to_string();

    if self
      .source
      .base_url
      .trim()
      .is_empty()
    {
      self.source.base_url =
        default_base_url();
    }

    if self.source.max_results == 0 {
      self.source.max_results =
        default_max_results();
    }

    if self.window.months_before == 0 {
      self.window.months_before =
        default_window_months();
    }
    if self.window.months_after == 0 {
      self.window.months_after =
        default_window_months();
    }
  }

  pub fn timezone(&self) -> Tz {
    resolve_timezone(
      self.timezone.as_deref()
    )
  }

  /// `$CALVIEW_API_KEY` wins over the
  /// file so keys can stay out of it.
  pub fn api_key(&self) -> Option<String> {
    std::env::var(API_KEY_ENV_VAR)
      .ok()
      .or_else(|| {
        self.source.api_key.clone()
      })
      .map(|key| key.trim().to_string())
      .filter(|key| !key.is_empty())
  }
}

fn resolve_config_path() -> Option<PathBuf>
{
  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  let candidates = std::env::current_dir()
    .ok()
    .map(|dir| dir.join(CONFIG_FILE_NAME))
    .into_iter()
    .chain(dirs::config_dir().map(|dir| {
      dir
        .join("calview")
        .join(CONFIG_FILE_NAME)
    }));

  for candidate in candidates {
    debug!(
      file = %candidate.display(),
      "checking config candidate"
    );
    if candidate.exists() {
      return Some(candidate);
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn parses_full_config() {
    let config = CalendarConfig::parse(
      r#"
        timezone = "America/Chicago"

        [source]
        calendar_id = " team@example.com "
        api_key = "abc"
        max_results = 100

        [window]
        months_before = 2
      "#
    )
    .expect("parse");

    assert_eq!(
      config.source.calendar_id,
      "team@example.com"
    );
    assert_eq!(
      config.source.max_results,
      100
    );
    assert_eq!(
      config.source.base_url,
      DEFAULT_BASE_URL
    );
    assert_eq!(
      config.window.months_before,
      2
    );
    assert_eq!(
      config.window.months_after,
      DEFAULT_WINDOW_MONTHS
    );
    assert_eq!(
      config.timezone.as_deref(),
      Some("America/Chicago")
    );
  }

  #[test]
  fn sanitizes_zero_and_blank_values() {
    let config = CalendarConfig::parse(
      r#"
        [source]
        base_url = "  "
        max_results = 0

        [window]
        months_before = 0
        months_after = 0
      "#
    )
    .expect("parse");

    assert_eq!(
      config.source.base_url,
      DEFAULT_BASE_URL
    );
    assert_eq!(
      config.source.max_results,
      DEFAULT_MAX_RESULTS
    );
    assert_eq!(
      config.window.months_before,
      DEFAULT_WINDOW_MONTHS
    );
    assert_eq!(
      config.window.months_after,
      DEFAULT_WINDOW_MONTHS
    );
  }

  #[test]
  fn empty_file_yields_defaults() {
    let config = CalendarConfig::parse("")
      .expect("parse");
    assert!(
      config.source.calendar_id.is_empty()
    );
    assert_eq!(
      config.source.max_results,
      DEFAULT_MAX_RESULTS
    );
  }

  #[test]
  fn explicit_missing_path_is_an_error() {
    let dir = tempfile::tempdir()
      .expect("tempdir");
    let missing =
      dir.path().join("nope.toml");
    assert!(
      CalendarConfig::load(Some(&missing))
        .is_err()
    );
  }

  #[test]
  fn loads_from_explicit_path() {
    let dir = tempfile::tempdir()
      .expect("tempdir");
    let path =
      dir.path().join(CONFIG_FILE_NAME);
    let mut file = fs::File::create(&path)
      .expect("create");
    writeln!(
      file,
      "[source]\ncalendar_id = \"abc\""
    )
    .expect("write");

    let config =
      CalendarConfig::load(Some(&path))
        .expect("load");
    assert_eq!(
      config.source.calendar_id,
      "abc"
    );
    assert_eq!(
      config.loaded_from.as_deref(),
      Some(path.as_path())
    );
  }

  #[test]
  fn rejects_malformed_toml() {
    assert!(
      CalendarConfig::parse(
        "timezone = ["
      )
      .is_err()
    );
  }
}
