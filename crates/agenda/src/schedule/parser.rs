//! Schedule document normalization
//!
//! Converts schedule/shifts documents to domain models.

use super::document::{ScheduleDocument, SessionEntry, ShiftsDocument};
use crate::models::{Meta, Session, SessionId, Shift};

/// Error raised for a document that cannot be applied
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Session {id} is scheduled on day {day}, but the schedule has {days} days")]
    DayOutOfRange { id: String, day: u32, days: u32 },

    #[error("Duplicate session id {0}")]
    DuplicateSession(String),
}

/// A parsed schedule ready to be diffed and stored
#[derive(Debug, Clone)]
pub struct ParsedSchedule {
    pub meta: Meta,
    pub sessions: Vec<Session>,
}

/// Parse a schedule document; `etag` is recorded in the resulting meta
pub fn parse_schedule(document: &str, etag: &str) -> Result<ParsedSchedule, ParseError> {
    let doc: ScheduleDocument = serde_json::from_str(document)?;

    let mut seen = std::collections::HashSet::new();
    let mut sessions = Vec::with_capacity(doc.sessions.len());
    for entry in doc.sessions {
        if entry.day == 0 || entry.day > doc.days {
            return Err(ParseError::DayOutOfRange {
                id: entry.id,
                day: entry.day,
                days: doc.days,
            });
        }
        if !seen.insert(entry.id.clone()) {
            return Err(ParseError::DuplicateSession(entry.id));
        }
        sessions.push(normalize_session(entry));
    }
    sessions.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    Ok(ParsedSchedule {
        meta: Meta {
            version: doc.version.trim().to_string(),
            title: doc.title,
            num_days: doc.days,
            etag: etag.to_string(),
        },
        sessions,
    })
}

/// Parse a shifts document
pub fn parse_shifts(document: &str) -> Result<Vec<Shift>, ParseError> {
    let doc: ShiftsDocument = serde_json::from_str(document)?;
    Ok(doc
        .shifts
        .into_iter()
        .map(|entry| Shift {
            id: entry.id,
            title: entry.title,
            room: entry.room,
            start: entry.start,
            duration_minutes: entry.duration,
        })
        .collect())
}

fn normalize_session(entry: SessionEntry) -> Session {
    Session::builder(SessionId::new(entry.id), entry.start)
        .title(entry.title.trim())
        .subtitle(entry.subtitle.unwrap_or_default().trim())
        .day(entry.day)
        .room(entry.room)
        .duration_minutes(entry.duration)
        .speakers(entry.speakers)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "version": " 23.1 ",
        "title": "Example Congress",
        "days": 2,
        "sessions": [
            {
                "id": "b",
                "title": "Closing",
                "day": 2,
                "room": "Hall 1",
                "start": "2025-12-28T17:00:00Z",
                "duration": 30
            },
            {
                "id": "a",
                "title": " Opening ",
                "subtitle": "Welcome",
                "day": 1,
                "room": "Hall 1",
                "start": "2025-12-27T10:00:00Z",
                "duration": 45,
                "speakers": ["Ada", "Grace"]
            }
        ]
    }"#;

    #[test]
    fn test_parse_schedule() {
        let parsed = parse_schedule(DOCUMENT, "\"etag-1\"").unwrap();

        assert_eq!(parsed.meta.version, "23.1");
        assert_eq!(parsed.meta.num_days, 2);
        assert_eq!(parsed.meta.etag, "\"etag-1\"");

        // Sorted by start time
        assert_eq!(parsed.sessions[0].id.as_str(), "a");
        assert_eq!(parsed.sessions[0].title, "Opening");
        assert_eq!(parsed.sessions[0].speakers, vec!["Ada", "Grace"]);
        assert_eq!(parsed.sessions[1].id.as_str(), "b");
        assert_eq!(parsed.sessions[1].subtitle, "");
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            parse_schedule("<schedule/>", ""),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_day_out_of_range() {
        let doc = r#"{"days": 1, "sessions": [
            {"id": "x", "title": "t", "day": 3, "room": "r",
             "start": "2025-01-01T00:00:00Z", "duration": 5}
        ]}"#;
        assert!(matches!(
            parse_schedule(doc, ""),
            Err(ParseError::DayOutOfRange { day: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_session() {
        let doc = r#"{"days": 1, "sessions": [
            {"id": "x", "title": "t", "day": 1, "room": "r",
             "start": "2025-01-01T00:00:00Z", "duration": 5},
            {"id": "x", "title": "u", "day": 1, "room": "r",
             "start": "2025-01-01T01:00:00Z", "duration": 5}
        ]}"#;
        assert!(matches!(
            parse_schedule(doc, ""),
            Err(ParseError::DuplicateSession(_))
        ));
    }

    #[test]
    fn test_parse_shifts() {
        let doc = r#"{"shifts": [
            {"id": "s1", "title": "Heaven desk", "start": "2025-12-27T08:00:00Z", "duration": 120}
        ]}"#;
        let shifts = parse_shifts(doc).unwrap();
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].duration_minutes, 120);
        assert_eq!(shifts[0].room, "");
    }
}
