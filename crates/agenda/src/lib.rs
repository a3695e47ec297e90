//! Agenda crate - Background conference schedule updates
//!
//! This crate provides platform-independent schedule synchronization:
//! - Domain models (Session, Meta, Shift, fetch and parse results)
//! - HTTP download with ETag handling and outcome classification
//! - Schedule document parsing and change detection
//! - Storage trait abstractions (in-memory and SQLite)
//! - The update pipeline: task coordinator, connectivity gate, notifier
//!
//! This crate has zero UI dependencies; mobile hosts use it through the
//! UniFFI bindings in [`ffi`].

uniffi::setup_scaffolding!();

pub mod alarm;
pub mod config;
pub mod ffi;
pub mod models;
pub mod net;
pub mod notify;
pub mod repository;
pub mod schedule;
pub mod storage;
pub mod sync;

pub use alarm::{ConferenceTimeFrame, TokioUpdateAlarm, UpdateAlarm, update_interval};
pub use config::Settings;
pub use models::{
    ChangeStatistic, FetchResult, FetchedSchedule, Meta, ParseResult, Session, SessionId, Shift,
};
pub use net::{HttpOutcome, ScheduleDownloader};
pub use notify::{
    ChangeNotifier, LogPresenter, NotificationPresenter, NotificationTexts,
    ScheduleUpdateNotification,
};
pub use repository::{AppRepository, ScheduleRepository};
pub use schedule::{ParseError, compute_changes, parse_schedule, parse_shifts};
pub use storage::{InMemoryScheduleStore, ScheduleStore, SqliteScheduleStore};
pub use sync::{
    // Update cycle
    CycleOutcome, SyncPipeline, Trigger, UpdateService, WorkHost, NoopWorkHost,
    // Task state
    CycleGuard, FetchCoordinator, TaskState,
    // Connectivity
    ConnectivityGate, ConnectivityMonitor, ManualConnectivity, Reachability, TcpProbe,
};
