//! Volunteer shifts loaded alongside the schedule

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single volunteer shift
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: String,
    pub title: String,
    pub room: String,
    pub start: DateTime<Utc>,
    /// Length in minutes
    pub duration_minutes: u32,
}
