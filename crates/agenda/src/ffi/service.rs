//! SyncService facade for UniFFI export
//!
//! Wraps the update service, its SQLite store and a private tokio runtime
//! behind a blocking, FFI-friendly API. Platform pieces (notifications,
//! alarms, work units, connectivity) are provided by the host through
//! callback interfaces.

use std::path::PathBuf;
use std::sync::Arc;

use crate::alarm::UpdateAlarm;
use crate::config::Settings;
use crate::ffi::types::*;
use crate::notify::{ChangeNotifier, NotificationPresenter, ScheduleUpdateNotification};
use crate::repository::{AppRepository, ScheduleRepository};
use crate::storage::SqliteScheduleStore;
use crate::sync::{
    ConnectivityGate, CycleOutcome, FetchCoordinator, ManualConnectivity, Reachability,
    SyncPipeline, UpdateService, WorkHost,
};

struct PresenterAdapter(Box<dyn FfiNotificationPresenter>);

impl NotificationPresenter for PresenterAdapter {
    fn present(&self, notification: ScheduleUpdateNotification) {
        self.0.present(notification.into());
    }
}

struct AlarmAdapter(Box<dyn FfiAlarmScheduler>);

impl UpdateAlarm for AlarmAdapter {
    fn set_update_alarm(&self, immediate: bool) {
        self.0.set_update_alarm(immediate);
    }

    fn discard_update_alarm(&self) {
        self.0.discard_update_alarm();
    }
}

struct WorkHostAdapter(Box<dyn FfiWorkHost>);

impl WorkHost for WorkHostAdapter {
    fn work_finished(&self, outcome: &CycleOutcome) {
        self.0.work_finished(outcome.clone().into());
    }
}

/// Main service object for schedule updates
///
/// This is the entry point for Swift/Kotlin background work. Methods block
/// the calling thread; call them from the platform's background worker.
#[derive(uniffi::Object)]
pub struct SyncService {
    runtime: tokio::runtime::Runtime,
    service: Arc<UpdateService>,
    repository: Arc<AppRepository>,
    connectivity: Arc<ManualConnectivity>,
}

#[uniffi::export]
impl SyncService {
    /// Create a new SyncService
    ///
    /// # Arguments
    /// * `settings_json` - Settings document (same format as settings.json)
    /// * `db_path` - Path to the SQLite database file
    /// * `presenter` - Shows schedule update notifications
    /// * `alarm` - Schedules the periodic update
    ///
    /// The network is assumed reachable until the host reports otherwise via
    /// `set_network_available`.
    #[uniffi::constructor]
    pub fn new(
        settings_json: String,
        db_path: String,
        presenter: Box<dyn FfiNotificationPresenter>,
        alarm: Box<dyn FfiAlarmScheduler>,
    ) -> Result<Arc<Self>, AgendaError> {
        let settings = Settings::from_json(&settings_json).map_err(|e| AgendaError::Config {
            message: format!("{:#}", e),
        })?;

        if let Some(parent) = PathBuf::from(&db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| AgendaError::Database {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }
        let store = SqliteScheduleStore::new(&db_path).map_err(|e| AgendaError::Database {
            message: format!("Failed to open database: {:#}", e),
        })?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("agenda-sync")
            .build()
            .map_err(|e| AgendaError::Runtime {
                message: format!("Failed to start runtime: {}", e),
            })?;

        let notifier = ChangeNotifier::new(
            Arc::new(PresenterAdapter(presenter)),
            settings.notification.clone(),
        );
        let repository = Arc::new(AppRepository::new(settings, Arc::new(store)));
        let connectivity = Arc::new(ManualConnectivity::new(Reachability::Available));

        let pipeline = SyncPipeline::new(
            Arc::new(FetchCoordinator::new()),
            ConnectivityGate::new(connectivity.clone()),
            repository.clone(),
            Arc::new(AlarmAdapter(alarm)),
            notifier,
        );

        Ok(Arc::new(Self {
            runtime,
            service: Arc::new(UpdateService::new(pipeline)),
            repository,
            connectivity,
        }))
    }

    // ========================================================================
    // Work Unit
    // ========================================================================

    /// Run one update cycle; `host.work_finished` is called exactly once
    pub fn handle_work(&self, trigger: FfiTrigger, host: Box<dyn FfiWorkHost>) -> FfiCycleOutcome {
        let host = WorkHostAdapter(host);
        let outcome = self
            .runtime
            .block_on(self.service.handle_work(trigger.into(), &host));
        outcome.into()
    }

    /// Tear down the running cycle, if any
    pub fn on_destroy(&self) {
        self.service.on_destroy();
    }

    /// Report platform reachability changes
    pub fn set_network_available(&self, available: bool) {
        self.connectivity.set_available(available);
    }

    pub fn task_state(&self) -> FfiTaskState {
        self.service.task_state().into()
    }

    // ========================================================================
    // Schedule Queries
    // ========================================================================

    /// Sessions changed by the most recent schedule update
    pub fn changed_sessions(&self) -> Result<Vec<FfiSession>, AgendaError> {
        let sessions = self.repository.load_changed_sessions()?;
        Ok(sessions.into_iter().map(FfiSession::from).collect())
    }

    /// Metadata of the applied schedule
    pub fn meta(&self) -> Result<FfiMeta, AgendaError> {
        Ok(self.repository.read_meta()?.into())
    }
}
