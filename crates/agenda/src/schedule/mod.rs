//! Schedule document handling
//!
//! This module provides:
//! - Wire types of the JSON schedule and shifts documents
//! - Normalization into domain models
//! - Change detection against the previously applied schedule

mod changes;
mod parser;

pub use changes::compute_changes;
pub use parser::{ParseError, ParsedSchedule, parse_schedule, parse_shifts};

/// Schedule document wire types
pub mod document {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    /// Top level of a schedule document
    #[derive(Debug, Deserialize)]
    pub struct ScheduleDocument {
        #[serde(default)]
        pub version: String,
        #[serde(default)]
        pub title: String,
        pub days: u32,
        #[serde(default)]
        pub sessions: Vec<SessionEntry>,
    }

    /// A session as published
    #[derive(Debug, Deserialize)]
    pub struct SessionEntry {
        pub id: String,
        pub title: String,
        #[serde(default)]
        pub subtitle: Option<String>,
        pub day: u32,
        pub room: String,
        pub start: DateTime<Utc>,
        /// Minutes
        pub duration: u32,
        #[serde(default)]
        pub speakers: Vec<String>,
    }

    /// Top level of a shifts document
    #[derive(Debug, Deserialize)]
    pub struct ShiftsDocument {
        #[serde(default)]
        pub shifts: Vec<ShiftEntry>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ShiftEntry {
        pub id: String,
        pub title: String,
        #[serde(default)]
        pub room: String,
        pub start: DateTime<Utc>,
        pub duration: u32,
    }
}
