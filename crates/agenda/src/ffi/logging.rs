//! Log records forwarded to the host (os_log, Logcat)
//!
//! Records from this crate pass at the configured level and are tagged with
//! their module, e.g. `Agenda/sync::pipeline`. Records from dependencies
//! (ureq, rustls, rusqlite) only pass from `Warn` up.

use std::sync::{Arc, OnceLock, RwLock};

use log::{Level, Log, Metadata, Record};

use super::types::{FfiLogLevel, LogCallback};

const CRATE_TARGET: &str = "agenda";
const TAG: &str = "Agenda";
const DEPENDENCY_LEVEL: Level = Level::Warn;

static HOST_LOGGER: OnceLock<HostLogger> = OnceLock::new();

struct Route {
    callback: Option<Arc<dyn LogCallback>>,
    level: Level,
}

struct HostLogger {
    route: RwLock<Route>,
}

fn is_own_target(target: &str) -> bool {
    target == CRATE_TARGET
        || target
            .strip_prefix(CRATE_TARGET)
            .is_some_and(|rest| rest.starts_with("::"))
}

/// Highest level forwarded for `target`
fn threshold(level: Level, target: &str) -> Level {
    if is_own_target(target) {
        level
    } else {
        level.min(DEPENDENCY_LEVEL)
    }
}

/// Tag shown next to the message on the host
fn host_tag(target: &str) -> String {
    if target == CRATE_TARGET {
        return TAG.to_string();
    }
    let module = target
        .strip_prefix(CRATE_TARGET)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(target);
    format!("{}/{}", TAG, module)
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.route.read().is_ok_and(|route| {
            route.callback.is_some()
                && metadata.level() <= threshold(route.level, metadata.target())
        })
    }

    fn log(&self, record: &Record) {
        let Ok(route) = self.route.read() else {
            return;
        };
        let Some(callback) = route.callback.as_ref() else {
            return;
        };
        if record.level() > threshold(route.level, record.target()) {
            return;
        }
        // Host errors are ignored; logging them would recurse.
        callback.on_log(
            FfiLogLevel::from(record.level()),
            host_tag(record.target()),
            record.args().to_string(),
        );
    }

    fn flush(&self) {}
}

fn route_to(callback: Option<Arc<dyn LogCallback>>, level: Level) {
    let logger = HOST_LOGGER.get_or_init(|| HostLogger {
        route: RwLock::new(Route {
            callback: None,
            level,
        }),
    });
    if let Ok(mut route) = logger.route.write() {
        if callback.is_some() {
            route.callback = callback;
        }
        route.level = level;
    }
    // Fails when a logger is installed already; ours stays in place then.
    let _ = log::set_logger(logger);
    log::set_max_level(level.to_level_filter());
}

/// Install the logger and route records to `callback`.
///
/// Calling it again swaps the callback and level.
#[uniffi::export]
pub fn initialize_logging(callback: Box<dyn LogCallback>, max_level: FfiLogLevel) {
    route_to(Some(Arc::from(callback)), Level::from(max_level));
}

/// Change the log level at runtime
#[uniffi::export]
pub fn set_logging_level(max_level: FfiLogLevel) {
    route_to(None, Level::from(max_level));
}
