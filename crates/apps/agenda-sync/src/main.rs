//! agenda-sync - Headless schedule updater
//!
//! Keeps the local schedule database current: updates at launch, whenever
//! the update alarm fires, and when `refresh` is typed on stdin. Ctrl-C tears
//! the running update down and exits.

use agenda::{
    AppRepository, ChangeNotifier, ConnectivityGate, CycleOutcome, FetchCoordinator,
    LogPresenter, Settings, SqliteScheduleStore, SyncPipeline, TcpProbe, TokioUpdateAlarm,
    Trigger, UpdateAlarm, UpdateService, WorkHost,
};
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Logs the end of every unit of work
struct LogWorkHost;

impl WorkHost for LogWorkHost {
    fn work_finished(&self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Completed {
                version, changed, ..
            } => info!("Schedule '{}' applied, {} changed sessions", version, changed),
            CycleOutcome::FetchFailed(outcome) => warn!("Update failed: {}", outcome),
            other => info!("Update finished: {:?}", other),
        }
    }
}

/// Forward `refresh` lines from stdin as manual triggers
async fn read_commands(triggers: mpsc::UnboundedSender<Trigger>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim() == "refresh" => {
                if triggers.send(Trigger::Manual).is_err() {
                    return;
                }
            }
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => warn!("Unknown command '{}', try 'refresh'", line.trim()),
            Ok(None) => return,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                return;
            }
        }
    }
}

fn load_settings() -> Result<Settings> {
    Settings::load().inspect_err(|_| {
        if let Some(path) = Settings::default_settings_path() {
            warn!(
                "To configure the schedule source, either:\n\
                 1. Place a settings file at: {}\n\
                 2. Or set the environment variable AGENDA_SCHEDULE_URL",
                path.display()
            );
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let settings = load_settings()?;
    let db_path = settings
        .database_path()
        .context("No data directory available for the schedule database")?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = SqliteScheduleStore::new(&db_path)?;
    info!("Using schedule database {}", db_path.display());

    let (triggers, receiver) = mpsc::unbounded_channel();
    let alarm = Arc::new(TokioUpdateAlarm::new(
        triggers.clone(),
        settings.conference_time_frame(),
    ));
    let probe = TcpProbe::for_url(&settings.schedule_url, settings.http_timeout())?;
    let notifier = ChangeNotifier::new(Arc::new(LogPresenter), settings.notification.clone());
    let repository = Arc::new(AppRepository::new(settings, Arc::new(store)));

    let pipeline = SyncPipeline::new(
        Arc::new(FetchCoordinator::new()),
        ConnectivityGate::new(Arc::new(probe)),
        repository,
        alarm.clone(),
        notifier,
    );
    let service = Arc::new(UpdateService::new(pipeline));

    triggers.send(Trigger::AppStart)?;
    tokio::spawn(read_commands(triggers));
    let runner = tokio::spawn(Arc::clone(&service).run(receiver, Arc::new(LogWorkHost)));

    info!("agenda-sync started, type 'refresh' to update now");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    service.on_destroy();
    alarm.discard_update_alarm();
    runner.abort();
    Ok(())
}
