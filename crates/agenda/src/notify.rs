//! Schedule update notifications
//!
//! [`ChangeNotifier`] decides the content of a notification; presenting it
//! (channel, sound, icon) is the job of a host [`NotificationPresenter`].

use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifier shared by every schedule update notification, so a new one
/// replaces the previous instead of stacking
pub const SCHEDULE_UPDATE_ID: i32 = 2;

/// Screen opened when the user taps the notification
pub const CONTENT_TARGET_SCHEDULE: &str = "schedule";

const VERSION_PLACEHOLDER: &str = "{version}";

/// Notification text templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTexts {
    /// Used when the schedule carries no version label
    pub updated: String,
    /// Used with a version label; `{version}` is replaced
    pub updated_to: String,
}

impl Default for NotificationTexts {
    fn default() -> Self {
        Self {
            updated: "Schedule updated".to_string(),
            updated_to: format!("Schedule updated to {}", VERSION_PLACEHOLDER),
        }
    }
}

impl NotificationTexts {
    /// Text for an update to `version`
    pub fn content_text(&self, version: Option<&str>) -> String {
        match version.map(str::trim).filter(|v| !v.is_empty()) {
            Some(version) => self.updated_to.replace(VERSION_PLACEHOLDER, version),
            None => self.updated.clone(),
        }
    }
}

/// A notification ready to be presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleUpdateNotification {
    pub id: i32,
    pub content_target: String,
    pub text: String,
    /// Number of changed sessions, for a badge
    pub count: u32,
    pub sound_uri: Option<String>,
}

/// Host side presentation of notifications
pub trait NotificationPresenter: Send + Sync {
    /// Show `notification`, replacing any shown notification with the same id
    fn present(&self, notification: ScheduleUpdateNotification);
}

/// Presenter that only logs, for headless hosts
pub struct LogPresenter;

impl NotificationPresenter for LogPresenter {
    fn present(&self, notification: ScheduleUpdateNotification) {
        info!(
            "[notification {}] {} ({} changes)",
            notification.id, notification.text, notification.count
        );
    }
}

/// Builds schedule update notifications and hands them to the presenter
pub struct ChangeNotifier {
    presenter: Arc<dyn NotificationPresenter>,
    texts: NotificationTexts,
}

impl ChangeNotifier {
    pub fn new(presenter: Arc<dyn NotificationPresenter>, texts: NotificationTexts) -> Self {
        Self { presenter, texts }
    }

    /// Announce an update to `version` with `changed_count` changed sessions.
    ///
    /// Whether to notify at all is decided by the caller; the count is only
    /// passed through for display.
    pub fn notify(&self, version: Option<&str>, changed_count: usize, sound_uri: Option<String>) {
        let notification = ScheduleUpdateNotification {
            id: SCHEDULE_UPDATE_ID,
            content_target: CONTENT_TARGET_SCHEDULE.to_string(),
            text: self.texts.content_text(version),
            count: u32::try_from(changed_count).unwrap_or(u32::MAX),
            sound_uri,
        };
        self.presenter.present(notification);
    }
}
