//! Settings for the schedule updater
//!
//! Settings are loaded from (in order of priority):
//! 1. Compile-time embedded schedule URL (for conference-specific builds)
//! 2. JSON file in the Agenda config directory
//! 3. Runtime environment variables (fallback)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::alarm::ConferenceTimeFrame;
use crate::notify::NotificationTexts;

/// Settings filename in the Agenda config directory
const SETTINGS_FILE: &str = "settings.json";

/// Database filename in the Agenda data directory
const DATABASE_FILE: &str = "agenda.sqlite";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Everything the updater needs to know about the conference and the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// URL of the schedule document
    pub schedule_url: String,
    /// URL of the volunteer shifts document, if the conference has one
    #[serde(default)]
    pub shifts_url: Option<String>,
    /// Sound played with update notifications
    #[serde(default)]
    pub alarm_tone_uri: Option<String>,
    /// First and last day of the conference; drives the update interval
    #[serde(default)]
    pub conference: Option<ConferenceTimeFrame>,
    #[serde(default)]
    pub notification: NotificationTexts,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// SQLite database location; defaults to the Agenda data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Settings {
    /// Settings pointing at `schedule_url` with defaults for everything else
    pub fn new(schedule_url: impl Into<String>) -> Self {
        Self {
            schedule_url: schedule_url.into(),
            shifts_url: None,
            alarm_tone_uri: None,
            conference: None,
            notification: NotificationTexts::default(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            database_path: None,
        }
    }

    /// Load settings using the following priority:
    /// 1. Compile-time embedded schedule URL
    /// 2. JSON file (~/.config/agenda/settings.json)
    /// 3. Runtime environment variables
    pub fn load() -> Result<Self> {
        if let Some(settings) = Self::from_compile_time() {
            return Ok(settings);
        }

        if config::config_exists(SETTINGS_FILE) {
            return config::load_json(SETTINGS_FILE);
        }

        Self::from_env()
    }

    /// Settings embedded at compile time.
    /// Build with: AGENDA_SCHEDULE_URL=https://... cargo build --release
    pub fn from_compile_time() -> Option<Self> {
        let url = option_env!("AGENDA_SCHEDULE_URL")?;
        if url.is_empty() {
            return None;
        }
        let mut settings = Self::new(url);
        settings.shifts_url = option_env!("AGENDA_SHIFTS_URL")
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        Some(settings)
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings JSON")
    }

    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("AGENDA_SCHEDULE_URL")
            .context("AGENDA_SCHEDULE_URL environment variable not set")?;
        let mut settings = Self::new(url);
        settings.shifts_url = std::env::var("AGENDA_SHIFTS_URL")
            .ok()
            .filter(|u| !u.is_empty());
        Ok(settings)
    }

    /// Persist these settings to the config directory
    pub fn save(&self) -> Result<()> {
        config::save_json(SETTINGS_FILE, self)
    }

    /// Default settings file path (~/.config/agenda/settings.json)
    pub fn default_settings_path() -> Option<PathBuf> {
        config::config_path(SETTINGS_FILE)
    }

    /// Configured database path, or the default in the data directory
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(|| config::data_dir().map(|d| d.join(DATABASE_FILE)))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Conference window, if configured
    pub fn conference_time_frame(&self) -> Option<ConferenceTimeFrame> {
        self.conference
    }

    /// Whether the conference has ended at `now` (no more updates needed)
    pub fn conference_over(&self, now: DateTime<Utc>) -> bool {
        self.conference.as_ref().is_some_and(|c| c.is_over(now))
    }
}
