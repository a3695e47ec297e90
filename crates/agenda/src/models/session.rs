//! Session model representing one entry of the conference schedule

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a session (as published in the schedule document)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A scheduled talk, workshop or other conference slot
///
/// The `changed_*`, `is_new` and `is_canceled` flags describe the difference
/// to the previously applied schedule and are recomputed on every parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    /// Conference day, starting at 1
    pub day: u32,
    pub room: String,
    pub start: DateTime<Utc>,
    /// Length in minutes
    pub duration_minutes: u32,
    #[serde(default)]
    pub speakers: Vec<String>,

    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_canceled: bool,
    #[serde(default)]
    pub changed_title: bool,
    #[serde(default)]
    pub changed_time: bool,
    #[serde(default)]
    pub changed_day: bool,
    #[serde(default)]
    pub changed_room: bool,
    #[serde(default)]
    pub changed_duration: bool,
    #[serde(default)]
    pub changed_speakers: bool,
}

impl Session {
    /// Create a new session builder
    pub fn builder(id: SessionId, start: DateTime<Utc>) -> SessionBuilder {
        SessionBuilder::new(id, start)
    }

    /// Whether any field differs from the previously applied schedule
    pub fn is_changed(&self) -> bool {
        self.is_new
            || self.is_canceled
            || self.changed_title
            || self.changed_time
            || self.changed_day
            || self.changed_room
            || self.changed_duration
            || self.changed_speakers
    }

    /// Reset every change flag
    pub fn clear_changes(&mut self) {
        self.is_new = false;
        self.is_canceled = false;
        self.changed_title = false;
        self.changed_time = false;
        self.changed_day = false;
        self.changed_room = false;
        self.changed_duration = false;
        self.changed_speakers = false;
    }
}

/// Builder for creating Session instances
pub struct SessionBuilder {
    session: Session,
}

impl SessionBuilder {
    fn new(id: SessionId, start: DateTime<Utc>) -> Self {
        Self {
            session: Session {
                id,
                title: String::new(),
                subtitle: String::new(),
                day: 1,
                room: String::new(),
                start,
                duration_minutes: 0,
                speakers: Vec::new(),
                is_new: false,
                is_canceled: false,
                changed_title: false,
                changed_time: false,
                changed_day: false,
                changed_room: false,
                changed_duration: false,
                changed_speakers: false,
            },
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.session.title = title.into();
        self
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.session.subtitle = subtitle.into();
        self
    }

    pub fn day(mut self, day: u32) -> Self {
        self.session.day = day;
        self
    }

    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.session.room = room.into();
        self
    }

    pub fn duration_minutes(mut self, minutes: u32) -> Self {
        self.session.duration_minutes = minutes;
        self
    }

    pub fn speakers(mut self, speakers: Vec<String>) -> Self {
        self.session.speakers = speakers;
        self
    }

    pub fn build(self) -> Session {
        self.session
    }
}

/// Counts of the kinds of changes in a changed-session list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeStatistic {
    pub new: usize,
    pub canceled: usize,
    pub changed: usize,
}

impl ChangeStatistic {
    /// Tally `sessions`; canceled wins over new, and both win over field changes
    pub fn of(sessions: &[Session]) -> Self {
        let mut stats = Self::default();
        for session in sessions {
            if session.is_canceled {
                stats.canceled += 1;
            } else if session.is_new {
                stats.new += 1;
            } else if session.is_changed() {
                stats.changed += 1;
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.new + self.canceled + self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str) -> Session {
        Session::builder(SessionId::new(id), Utc::now())
            .title("Opening")
            .room("Hall 1")
            .duration_minutes(30)
            .build()
    }

    #[test]
    fn test_new_session_is_unchanged() {
        assert!(!session("1").is_changed());
    }

    #[test]
    fn test_any_flag_marks_changed() {
        let mut s = session("1");
        s.changed_room = true;
        assert!(s.is_changed());

        s.clear_changes();
        assert!(!s.is_changed());
    }

    #[test]
    fn test_change_statistic() {
        let mut added = session("1");
        added.is_new = true;
        let mut canceled = session("2");
        canceled.is_canceled = true;
        canceled.is_new = true;
        let mut moved = session("3");
        moved.changed_time = true;

        let stats = ChangeStatistic::of(&[added, canceled, moved, session("4")]);
        assert_eq!(stats, ChangeStatistic { new: 1, canceled: 1, changed: 1 });
        assert_eq!(stats.total(), 3);
    }
}
