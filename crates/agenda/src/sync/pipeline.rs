//! One end-to-end update cycle
//!
//! Steps run strictly in sequence: connectivity gate, alarm re-arm, fetch,
//! parse, change query and notification, shifts. Blocking repository work runs
//! on `spawn_blocking` and is raced against the cycle's cancellation token.

use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::connectivity::ConnectivityGate;
use super::coordinator::{CycleGuard, FetchCoordinator};
use super::{CycleOutcome, Trigger};
use crate::alarm::UpdateAlarm;
use crate::models::{ChangeStatistic, FetchResult, ParseResult};
use crate::net::HttpOutcome;
use crate::notify::ChangeNotifier;
use crate::repository::ScheduleRepository;

/// Why a blocking step produced no value
enum Interrupted {
    Cancelled,
    Failed(String),
}

/// Run `work` on a blocking worker unless `token` is cancelled first.
///
/// On cancellation the worker is still awaited: it shares the token and must
/// have let go of its connection and the store before the cycle can end.
async fn blocking<T, F>(token: &CancellationToken, work: F) -> Result<T, Interrupted>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let mut task = tokio::task::spawn_blocking(work);
    tokio::select! {
        biased;
        _ = token.cancelled() => {}
        joined = &mut task => return joined.map_err(|e| Interrupted::Failed(e.to_string())),
    }
    if let Err(e) = task.await {
        debug!("Cancelled worker failed: {}", e);
    }
    Err(Interrupted::Cancelled)
}

/// Orchestrates update cycles
pub struct SyncPipeline {
    coordinator: Arc<FetchCoordinator>,
    gate: ConnectivityGate,
    repository: Arc<dyn ScheduleRepository>,
    alarm: Arc<dyn UpdateAlarm>,
    notifier: ChangeNotifier,
}

impl SyncPipeline {
    pub fn new(
        coordinator: Arc<FetchCoordinator>,
        gate: ConnectivityGate,
        repository: Arc<dyn ScheduleRepository>,
        alarm: Arc<dyn UpdateAlarm>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            coordinator,
            gate,
            repository,
            alarm,
            notifier,
        }
    }

    pub fn coordinator(&self) -> &Arc<FetchCoordinator> {
        &self.coordinator
    }

    pub fn repository(&self) -> &Arc<dyn ScheduleRepository> {
        &self.repository
    }

    /// Run one cycle for `trigger`.
    ///
    /// Never fails: every problem ends the cycle, is logged, and is reflected
    /// in the returned outcome. The coordinator is back in `Idle` when this
    /// returns or when the future is dropped.
    pub async fn run(&self, trigger: Trigger) -> CycleOutcome {
        debug!("Update triggered by {:?}", trigger);

        if !self.gate.determine().await {
            info!("Network not available, skipping schedule update");
            return CycleOutcome::NoConnectivity;
        }

        // Scheduled before the fetch so a failure still leaves a next attempt.
        self.alarm.set_update_alarm(false);

        let Some(cycle) = self.coordinator.begin_cycle() else {
            info!("Schedule update already running, dropping {:?} trigger", trigger);
            return CycleOutcome::Dropped;
        };

        let outcome = self.run_cycle(&cycle).await;
        cycle.complete();
        outcome
    }

    async fn run_cycle(&self, cycle: &CycleGuard) -> CycleOutcome {
        let url = match self.repository.read_schedule_url() {
            Ok(url) => url,
            Err(e) => {
                error!("No schedule URL: {:#}", e);
                return CycleOutcome::FetchFailed(HttpOutcome::CouldNotConnect);
            }
        };
        info!("Fetching schedule from {}", url);

        let token = cycle.token().clone();
        let fetched = {
            let repository = Arc::clone(&self.repository);
            let cancel = token.clone();
            blocking(&token, move || repository.fetch_schedule(&url, &cancel)).await
        };
        let result = match fetched {
            Ok(result) => result,
            Err(interrupted) => return interrupted_outcome(interrupted),
        };

        if cycle.is_cancelled() {
            debug!("Fetch finished after cancellation, discarding result");
            return CycleOutcome::Cancelled;
        }

        let FetchResult {
            outcome,
            host_name,
            exception_message,
            payload,
        } = result;

        if outcome.is_not_modified() {
            info!("Schedule on {} not modified", host_name);
            return CycleOutcome::NotModified;
        }
        if !outcome.is_successful() {
            warn!(
                "Fetching schedule from {} failed: {} {}",
                host_name, outcome, exception_message
            );
            return CycleOutcome::FetchFailed(outcome);
        }
        let Some(document) = payload else {
            error!("Fetch from {} succeeded without a document", host_name);
            return CycleOutcome::FetchFailed(HttpOutcome::CannotParseContent);
        };

        cycle.mark_parsing();

        let parsed = {
            let repository = Arc::clone(&self.repository);
            let cancel = token.clone();
            blocking(&token, move || repository.parse_schedule(document, &cancel)).await
        };
        let schedule = match parsed {
            Ok(result) => result,
            Err(interrupted) => return interrupted_outcome(interrupted),
        };

        // Cancellation discards the parse unless the schedule was already committed.
        if cycle.is_cancelled() && !schedule.is_success() {
            debug!("Parse finished after cancellation, discarding result");
            return CycleOutcome::Cancelled;
        }

        let outcome = self.on_parse_result(schedule).await;
        self.load_shifts(cycle).await;
        outcome
    }

    /// Load shifts after the schedule result has been handled
    async fn load_shifts(&self, cycle: &CycleGuard) {
        let token = cycle.token().clone();
        let shifts = {
            let repository = Arc::clone(&self.repository);
            let cancel = token.clone();
            blocking(&token, move || repository.load_shifts(&cancel)).await
        };
        match shifts {
            Ok(Some(result)) if !cycle.is_cancelled() => {
                self.on_parse_result(result).await;
            }
            Ok(Some(_)) | Err(Interrupted::Cancelled) => debug!("Shifts loading cancelled"),
            Ok(None) => {}
            Err(Interrupted::Failed(message)) => error!("Loading shifts failed: {}", message),
        }
    }

    /// Query the change set and notify for schedule results with changes
    async fn on_parse_result(&self, result: ParseResult) -> CycleOutcome {
        if !result.is_success() {
            warn!("Parsing failed: {:?}", result);
        }

        let repository = Arc::clone(&self.repository);
        let changed =
            match tokio::task::spawn_blocking(move || repository.load_changed_sessions()).await {
                Ok(Ok(changed)) => changed,
                Ok(Err(e)) => {
                    error!("Failed to load changed sessions: {:#}", e);
                    Vec::new()
                }
                Err(e) => {
                    error!("Changed sessions task failed: {}", e);
                    Vec::new()
                }
            };

        let stats = ChangeStatistic::of(&changed);
        info!(
            "Changed sessions: {} new, {} canceled, {} changed",
            stats.new, stats.canceled, stats.changed
        );

        match result {
            ParseResult::Schedule { version, success } => {
                let notified = !changed.is_empty();
                if notified {
                    self.notifier.notify(
                        Some(&version),
                        changed.len(),
                        self.repository.read_alarm_tone_uri(),
                    );
                }
                CycleOutcome::Completed {
                    version,
                    success,
                    changed: changed.len(),
                    notified,
                }
            }
            ParseResult::Shifts { success } => {
                debug!("Shifts loaded (success={})", success);
                CycleOutcome::Completed {
                    version: String::new(),
                    success,
                    changed: changed.len(),
                    notified: false,
                }
            }
        }
    }
}

fn interrupted_outcome(interrupted: Interrupted) -> CycleOutcome {
    match interrupted {
        Interrupted::Cancelled => {
            debug!("Cycle cancelled");
            CycleOutcome::Cancelled
        }
        Interrupted::Failed(message) => {
            error!("Update step failed: {}", message);
            CycleOutcome::FetchFailed(HttpOutcome::CouldNotConnect)
        }
    }
}
