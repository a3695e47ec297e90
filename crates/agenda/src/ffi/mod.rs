//! FFI bindings for UniFFI export
//!
//! This module provides Swift/Kotlin bindings for the agenda crate via UniFFI.
//!
//! ## Usage from Kotlin
//!
//! ```kotlin
//! // Initialize logging first
//! initializeLogging(callback = logcatCallback, maxLevel = FfiLogLevel.INFO)
//!
//! // One service per process
//! val service = SyncService(
//!     settingsJson = settingsJson,
//!     dbPath = "${filesDir}/agenda.sqlite",
//!     presenter = notificationPresenter,
//!     alarm = alarmScheduler,
//! )
//!
//! // From the background work unit
//! service.handleWork(trigger = FfiTrigger.ALARM, host = workHost)
//!
//! // From the work unit's teardown hook
//! service.onDestroy()
//! ```

mod logging;
mod service;
mod types;

// Re-export all FFI types and the SyncService
pub use logging::{initialize_logging, set_logging_level};
pub use service::*;
pub use types::*;
