//! Change detection between two versions of the schedule

use std::collections::{HashMap, HashSet};

use crate::models::Session;

/// Flag the differences of `fresh` against `previous`
///
/// Returns the sessions to store: every fresh session with its change flags
/// set, followed by sessions that disappeared (flagged `is_canceled`).
/// Sessions that were already canceled in `previous` and are still missing
/// are dropped. Without a previous schedule nothing is flagged.
pub fn compute_changes(previous: &[Session], fresh: Vec<Session>) -> Vec<Session> {
    if previous.is_empty() {
        return fresh
            .into_iter()
            .map(|mut s| {
                s.clear_changes();
                s
            })
            .collect();
    }

    let old_by_id: HashMap<&str, &Session> =
        previous.iter().map(|s| (s.id.as_str(), s)).collect();
    let fresh_ids: HashSet<String> = fresh.iter().map(|s| s.id.0.clone()).collect();

    let mut result: Vec<Session> = fresh
        .into_iter()
        .map(|mut session| {
            session.clear_changes();
            match old_by_id.get(session.id.as_str()) {
                Some(old) if !old.is_canceled => flag_field_changes(old, &mut session),
                _ => session.is_new = true,
            }
            session
        })
        .collect();

    for old in previous {
        if old.is_canceled || fresh_ids.contains(old.id.as_str()) {
            continue;
        }
        let mut canceled = old.clone();
        canceled.clear_changes();
        canceled.is_canceled = true;
        result.push(canceled);
    }

    result
}

fn flag_field_changes(old: &Session, session: &mut Session) {
    session.changed_title = old.title != session.title || old.subtitle != session.subtitle;
    session.changed_time = old.start != session.start;
    session.changed_day = old.day != session.day;
    session.changed_room = old.room != session.room;
    session.changed_duration = old.duration_minutes != session.duration_minutes;
    session.changed_speakers = old.speakers != session.speakers;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionId;
    use chrono::{Duration, TimeZone, Utc};

    fn session(id: &str, room: &str) -> Session {
        Session::builder(
            SessionId::new(id),
            Utc.with_ymd_and_hms(2025, 12, 27, 10, 0, 0).unwrap(),
        )
        .title(format!("Talk {}", id))
        .room(room)
        .duration_minutes(40)
        .build()
    }

    fn changed(sessions: &[Session]) -> Vec<&str> {
        sessions
            .iter()
            .filter(|s| s.is_changed())
            .map(|s| s.id.as_str())
            .collect()
    }

    #[test]
    fn test_first_schedule_has_no_changes() {
        let result = compute_changes(&[], vec![session("1", "A"), session("2", "B")]);
        assert_eq!(result.len(), 2);
        assert!(changed(&result).is_empty());
    }

    #[test]
    fn test_identical_schedule_has_no_changes() {
        let old = vec![session("1", "A"), session("2", "B")];
        let result = compute_changes(&old, old.clone());
        assert!(changed(&result).is_empty());
    }

    #[test]
    fn test_field_changes() {
        let old = vec![session("1", "A"), session("2", "B")];
        let mut moved = session("1", "C");
        moved.start = moved.start + Duration::minutes(30);

        let result = compute_changes(&old, vec![moved, session("2", "B")]);

        assert_eq!(changed(&result), vec!["1"]);
        assert!(result[0].changed_room);
        assert!(result[0].changed_time);
        assert!(!result[0].changed_title);
    }

    #[test]
    fn test_new_and_canceled_sessions() {
        let old = vec![session("1", "A"), session("2", "B")];
        let result = compute_changes(&old, vec![session("1", "A"), session("3", "C")]);

        assert_eq!(result.len(), 3);
        let added = result.iter().find(|s| s.id.as_str() == "3").unwrap();
        assert!(added.is_new);
        let removed = result.iter().find(|s| s.id.as_str() == "2").unwrap();
        assert!(removed.is_canceled);
    }

    #[test]
    fn test_canceled_sessions_are_not_carried_twice() {
        let mut gone = session("2", "B");
        gone.is_canceled = true;
        let old = vec![session("1", "A"), gone];

        let result = compute_changes(&old, vec![session("1", "A")]);
        assert_eq!(result.len(), 1);
        assert!(changed(&result).is_empty());
    }

    #[test]
    fn test_reappearing_session_is_new() {
        let mut gone = session("2", "B");
        gone.is_canceled = true;
        let old = vec![session("1", "A"), gone];

        let result = compute_changes(&old, vec![session("1", "A"), session("2", "B")]);
        assert_eq!(changed(&result), vec!["2"]);
        assert!(result[1].is_new);
    }
}
