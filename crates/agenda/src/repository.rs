//! Repository façade used by the update pipeline
//!
//! [`ScheduleRepository`] is the seam between the pipeline and everything
//! that touches the network or the database. [`AppRepository`] is the
//! production implementation: ureq downloads, JSON parsing, change detection
//! and a [`ScheduleStore`].

use anyhow::Result;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::models::{FetchResult, FetchedSchedule, Meta, ParseResult, Session};
use crate::net::{self, Download, HttpOutcome, ScheduleDownloader};
use crate::schedule::{compute_changes, parse_schedule, parse_shifts};
use crate::storage::ScheduleStore;

/// Network, parsing and persistence operations needed by one update cycle
///
/// Methods are blocking; async callers run them on a blocking worker. Long
/// running methods take the cycle's cancellation token and must return
/// promptly once it is cancelled.
pub trait ScheduleRepository: Send + Sync {
    /// URL of the schedule document
    fn read_schedule_url(&self) -> Result<String>;

    /// Metadata of the applied schedule
    fn read_meta(&self) -> Result<Meta>;

    /// Download the schedule document
    fn fetch_schedule(&self, url: &str, cancel: &CancellationToken) -> FetchResult;

    /// Parse and apply a downloaded document, recomputing session changes
    fn parse_schedule(&self, fetched: FetchedSchedule, cancel: &CancellationToken) -> ParseResult;

    /// Load auxiliary shifts data; `None` when no shifts source is configured
    fn load_shifts(&self, cancel: &CancellationToken) -> Option<ParseResult>;

    /// Sessions that differ from the previously applied schedule
    fn load_changed_sessions(&self) -> Result<Vec<Session>>;

    /// Sound to play with update notifications
    fn read_alarm_tone_uri(&self) -> Option<String>;

    /// Abort whatever is loading right now
    fn cancel_loading(&self);
}

/// Production repository
pub struct AppRepository {
    settings: Settings,
    downloader: ScheduleDownloader,
    store: Arc<dyn ScheduleStore>,
    loading: Mutex<Option<CancellationToken>>,
}

impl AppRepository {
    pub fn new(settings: Settings, store: Arc<dyn ScheduleStore>) -> Self {
        let downloader = ScheduleDownloader::new(settings.http_timeout());
        Self {
            settings,
            downloader,
            store,
            loading: Mutex::new(None),
        }
    }

    /// The underlying store, for read access by the host
    pub fn store(&self) -> &Arc<dyn ScheduleStore> {
        &self.store
    }

    fn track(&self, cancel: &CancellationToken) {
        if let Ok(mut loading) = self.loading.lock() {
            *loading = Some(cancel.clone());
        }
    }

    fn apply(&self, fetched: FetchedSchedule, cancel: &CancellationToken) -> Result<ParseResult> {
        let parsed = match parse_schedule(&fetched.document, &fetched.etag) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Failed to parse schedule: {}", e);
                return Ok(ParseResult::Schedule {
                    version: String::new(),
                    success: false,
                });
            }
        };

        let previous = self.store.list_sessions()?;
        let sessions = compute_changes(&previous, parsed.sessions);
        let version = parsed.meta.version.clone();

        // Nothing may be committed once the cycle is cancelled: the ETag
        // would hide these changes from the next fetch.
        if cancel.is_cancelled() {
            debug!("Not applying schedule version='{}', loading was cancelled", version);
            return Ok(ParseResult::Schedule {
                version: String::new(),
                success: false,
            });
        }
        info!(
            "Applying schedule version='{}' with {} sessions",
            version,
            sessions.len()
        );
        self.store.apply_schedule(parsed.meta, sessions)?;

        Ok(ParseResult::Schedule {
            version,
            success: true,
        })
    }
}

impl ScheduleRepository for AppRepository {
    fn read_schedule_url(&self) -> Result<String> {
        Ok(self.settings.schedule_url.clone())
    }

    fn read_meta(&self) -> Result<Meta> {
        self.store.read_meta()
    }

    fn fetch_schedule(&self, url: &str, cancel: &CancellationToken) -> FetchResult {
        self.track(cancel);

        let host_name = match net::host_name(url) {
            Ok(host) => host,
            Err(e) => {
                error!("Refusing to fetch schedule: {}", e);
                return FetchResult::failure(HttpOutcome::CouldNotConnect, "", e.to_string());
            }
        };

        if cancel.is_cancelled() {
            return FetchResult::failure(HttpOutcome::CouldNotConnect, host_name, "cancelled");
        }

        let etag = match self.store.read_meta() {
            Ok(meta) => meta.etag,
            Err(e) => {
                warn!("Could not read stored etag, fetching unconditionally: {}", e);
                String::new()
            }
        };

        match self.downloader.download(url, &etag, cancel) {
            Download::Ok { document, etag } => FetchResult::ok(host_name, document, etag),
            Download::NotModified => FetchResult::not_modified(host_name),
            Download::Cancelled => {
                FetchResult::failure(HttpOutcome::CouldNotConnect, host_name, "cancelled")
            }
            Download::Failure { outcome, message } => {
                FetchResult::failure(outcome, host_name, message)
            }
        }
    }

    fn parse_schedule(&self, fetched: FetchedSchedule, cancel: &CancellationToken) -> ParseResult {
        if cancel.is_cancelled() {
            debug!("Parse skipped, loading was cancelled");
            return ParseResult::Schedule {
                version: String::new(),
                success: false,
            };
        }

        self.apply(fetched, cancel).unwrap_or_else(|e| {
            error!("Failed to store schedule: {:#}", e);
            ParseResult::Schedule {
                version: String::new(),
                success: false,
            }
        })
    }

    fn load_shifts(&self, cancel: &CancellationToken) -> Option<ParseResult> {
        let url = self.settings.shifts_url.as_deref()?;
        if cancel.is_cancelled() {
            return Some(ParseResult::Shifts { success: false });
        }

        let success = match self.downloader.download(url, "", cancel) {
            Download::Ok { document, .. } => match parse_shifts(&document) {
                Ok(shifts) => {
                    info!("Loaded {} shifts", shifts.len());
                    match self.store.replace_shifts(shifts) {
                        Ok(()) => true,
                        Err(e) => {
                            error!("Failed to store shifts: {:#}", e);
                            false
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to parse shifts: {}", e);
                    false
                }
            },
            // Shifts are fetched unconditionally, so this only happens with odd servers.
            Download::NotModified => true,
            Download::Cancelled => {
                debug!("Shifts download cancelled");
                false
            }
            Download::Failure { outcome, message } => {
                error!("Failed to load shifts: {} ({})", outcome, message);
                false
            }
        };

        Some(ParseResult::Shifts { success })
    }

    fn load_changed_sessions(&self) -> Result<Vec<Session>> {
        self.store.list_changed_sessions()
    }

    fn read_alarm_tone_uri(&self) -> Option<String> {
        self.settings.alarm_tone_uri.clone()
    }

    fn cancel_loading(&self) {
        if let Ok(mut loading) = self.loading.lock() {
            if let Some(token) = loading.take() {
                debug!("Cancelling schedule loading");
                token.cancel();
            }
        }
    }
}
