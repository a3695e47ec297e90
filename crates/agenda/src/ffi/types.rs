//! FFI-friendly type wrappers for UniFFI export
//!
//! These types convert internal Rust types to FFI-compatible versions:
//! - `DateTime<Utc>` → `i64` (Unix timestamp)
//! - `SessionId` → `String`
//! - Core traits → callback interfaces implemented by the host

use crate::models::{Meta, Session};
use crate::net::HttpOutcome;
use crate::notify::ScheduleUpdateNotification;
use crate::sync::{CycleOutcome, TaskState, Trigger};

// ============================================================================
// Error Types
// ============================================================================

/// FFI-friendly error type
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum AgendaError {
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Runtime error: {message}")]
    Runtime { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl From<anyhow::Error> for AgendaError {
    fn from(e: anyhow::Error) -> Self {
        let msg = format!("{:#}", e);
        if msg.contains("settings") || msg.contains("URL") {
            AgendaError::Config { message: msg }
        } else {
            AgendaError::Database { message: msg }
        }
    }
}

// ============================================================================
// Sync Types
// ============================================================================

/// What started an update, as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiTrigger {
    Alarm,
    Manual,
    AppStart,
}

impl From<FfiTrigger> for Trigger {
    fn from(t: FfiTrigger) -> Self {
        match t {
            FfiTrigger::Alarm => Trigger::Alarm,
            FfiTrigger::Manual => Trigger::Manual,
            FfiTrigger::AppStart => Trigger::AppStart,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiTaskState {
    Idle,
    Fetching,
    Parsing,
    FetchCancelled,
}

impl From<TaskState> for FfiTaskState {
    fn from(s: TaskState) -> Self {
        match s {
            TaskState::Idle => FfiTaskState::Idle,
            TaskState::Fetching => FfiTaskState::Fetching,
            TaskState::Parsing => FfiTaskState::Parsing,
            TaskState::FetchCancelled => FfiTaskState::FetchCancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiHttpOutcome {
    Ok,
    NotModified,
    UntrustedCertificate,
    DnsFailure,
    CouldNotConnect,
    SslSetupFailure,
    CannotParseContent,
    WrongCredentials,
    ConnectTimeout,
    NotFound,
    CleartextNotPermitted,
}

impl From<HttpOutcome> for FfiHttpOutcome {
    fn from(o: HttpOutcome) -> Self {
        match o {
            HttpOutcome::Ok => FfiHttpOutcome::Ok,
            HttpOutcome::NotModified => FfiHttpOutcome::NotModified,
            HttpOutcome::UntrustedCertificate => FfiHttpOutcome::UntrustedCertificate,
            HttpOutcome::DnsFailure => FfiHttpOutcome::DnsFailure,
            HttpOutcome::CouldNotConnect => FfiHttpOutcome::CouldNotConnect,
            HttpOutcome::SslSetupFailure => FfiHttpOutcome::SslSetupFailure,
            HttpOutcome::CannotParseContent => FfiHttpOutcome::CannotParseContent,
            HttpOutcome::WrongCredentials => FfiHttpOutcome::WrongCredentials,
            HttpOutcome::ConnectTimeout => FfiHttpOutcome::ConnectTimeout,
            HttpOutcome::NotFound => FfiHttpOutcome::NotFound,
            HttpOutcome::CleartextNotPermitted => FfiHttpOutcome::CleartextNotPermitted,
        }
    }
}

/// How an update ended
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiCycleOutcome {
    Dropped,
    NoConnectivity,
    FetchFailed { outcome: FfiHttpOutcome },
    NotModified,
    Cancelled,
    Completed {
        version: String,
        success: bool,
        changed: u32,
        notified: bool,
    },
}

impl From<CycleOutcome> for FfiCycleOutcome {
    fn from(o: CycleOutcome) -> Self {
        match o {
            CycleOutcome::Dropped => FfiCycleOutcome::Dropped,
            CycleOutcome::NoConnectivity => FfiCycleOutcome::NoConnectivity,
            CycleOutcome::FetchFailed(outcome) => FfiCycleOutcome::FetchFailed {
                outcome: outcome.into(),
            },
            CycleOutcome::NotModified => FfiCycleOutcome::NotModified,
            CycleOutcome::Cancelled => FfiCycleOutcome::Cancelled,
            CycleOutcome::Completed {
                version,
                success,
                changed,
                notified,
            } => FfiCycleOutcome::Completed {
                version,
                success,
                changed: changed as u32,
                notified,
            },
        }
    }
}

// ============================================================================
// Schedule Types
// ============================================================================

/// FFI-friendly session representation
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub day: u32,
    pub room: String,
    /// Unix timestamp (seconds since epoch)
    pub start: i64,
    pub duration_minutes: u32,
    pub speakers: Vec<String>,
    pub is_new: bool,
    pub is_canceled: bool,
    pub changed_title: bool,
    pub changed_time: bool,
    pub changed_day: bool,
    pub changed_room: bool,
    pub changed_duration: bool,
    pub changed_speakers: bool,
}

impl From<Session> for FfiSession {
    fn from(s: Session) -> Self {
        Self {
            id: s.id.0,
            title: s.title,
            subtitle: s.subtitle,
            day: s.day,
            room: s.room,
            start: s.start.timestamp(),
            duration_minutes: s.duration_minutes,
            speakers: s.speakers,
            is_new: s.is_new,
            is_canceled: s.is_canceled,
            changed_title: s.changed_title,
            changed_time: s.changed_time,
            changed_day: s.changed_day,
            changed_room: s.changed_room,
            changed_duration: s.changed_duration,
            changed_speakers: s.changed_speakers,
        }
    }
}

/// FFI-friendly schedule metadata
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeta {
    pub version: String,
    pub title: String,
    pub num_days: u32,
    pub etag: String,
}

impl From<Meta> for FfiMeta {
    fn from(m: Meta) -> Self {
        Self {
            version: m.version,
            title: m.title,
            num_days: m.num_days,
            etag: m.etag,
        }
    }
}

/// Notification to be shown by the host
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    /// Fixed id; a new notification replaces the shown one
    pub id: i32,
    /// Screen to open on tap
    pub content_target: String,
    pub text: String,
    pub count: u32,
    pub sound_uri: Option<String>,
}

impl From<ScheduleUpdateNotification> for FfiNotification {
    fn from(n: ScheduleUpdateNotification) -> Self {
        Self {
            id: n.id,
            content_target: n.content_target,
            text: n.text,
            count: n.count,
            sound_uri: n.sound_uri,
        }
    }
}

// ============================================================================
// Host Callbacks
// ============================================================================

/// Platform notification presentation
#[uniffi::export(callback_interface)]
pub trait FfiNotificationPresenter: Send + Sync {
    fn present(&self, notification: FfiNotification);
}

/// Platform alarm scheduling (AlarmManager, BGTaskScheduler, ...)
#[uniffi::export(callback_interface)]
pub trait FfiAlarmScheduler: Send + Sync {
    /// Schedule the next update; `immediate` fires right away
    fn set_update_alarm(&self, immediate: bool);
    fn discard_update_alarm(&self);
}

/// Platform background work unit
#[uniffi::export(callback_interface)]
pub trait FfiWorkHost: Send + Sync {
    /// Called exactly once per `handle_work`
    fn work_finished(&self, outcome: FfiCycleOutcome);
}

// ============================================================================
// Log Callback
// ============================================================================

/// Log level for FFI callback
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<log::Level> for FfiLogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => FfiLogLevel::Error,
            log::Level::Warn => FfiLogLevel::Warn,
            log::Level::Info => FfiLogLevel::Info,
            log::Level::Debug => FfiLogLevel::Debug,
            log::Level::Trace => FfiLogLevel::Trace,
        }
    }
}

impl From<FfiLogLevel> for log::Level {
    fn from(level: FfiLogLevel) -> Self {
        match level {
            FfiLogLevel::Error => log::Level::Error,
            FfiLogLevel::Warn => log::Level::Warn,
            FfiLogLevel::Info => log::Level::Info,
            FfiLogLevel::Debug => log::Level::Debug,
            FfiLogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Callback interface for receiving log messages from Rust
///
/// Hosts forward these to os_log / Logcat.
#[uniffi::export(callback_interface)]
pub trait LogCallback: Send + Sync {
    /// Called when a log message is emitted
    ///
    /// # Arguments
    /// * `level` - The log level (error, warn, info, debug, trace)
    /// * `target` - Tag naming the source, e.g. "Agenda/sync::pipeline"
    /// * `message` - The log message
    fn on_log(&self, level: FfiLogLevel, target: String, message: String);
}
