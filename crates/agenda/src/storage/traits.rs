//! Storage trait definitions

use crate::models::{Meta, Session, Shift};
use anyhow::Result;

/// Trait for schedule storage operations
///
/// Abstracts over storage backends (in-memory, SQLite). A schedule is always
/// applied as a whole: metadata and sessions change together.
pub trait ScheduleStore: Send + Sync {
    /// Metadata of the applied schedule (default when nothing was applied)
    fn read_meta(&self) -> Result<Meta>;

    /// Replace metadata and all sessions in one step
    fn apply_schedule(&self, meta: Meta, sessions: Vec<Session>) -> Result<()>;

    /// All stored sessions, ordered by start time then id
    fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Stored sessions with at least one change flag, ordered like `list_sessions`
    fn list_changed_sessions(&self) -> Result<Vec<Session>> {
        Ok(self
            .list_sessions()?
            .into_iter()
            .filter(Session::is_changed)
            .collect())
    }

    /// Replace all stored shifts
    fn replace_shifts(&self, shifts: Vec<Shift>) -> Result<()>;

    /// All stored shifts, ordered by start time
    fn list_shifts(&self) -> Result<Vec<Shift>>;

    /// Clear all data (for testing and resets)
    fn clear(&self) -> Result<()>;
}
