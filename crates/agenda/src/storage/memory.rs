//! In-memory storage implementation
//!
//! Used by tests and by hosts that keep no local database.

use anyhow::{Result, anyhow};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::ScheduleStore;
use crate::models::{Meta, Session, Shift};

#[derive(Default)]
struct Data {
    meta: Meta,
    sessions: Vec<Session>,
    shifts: Vec<Shift>,
}

/// In-memory implementation of ScheduleStore
#[derive(Default)]
pub struct InMemoryScheduleStore {
    data: RwLock<Data>,
}

impl InMemoryScheduleStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Data>> {
        self.data.read().map_err(|_| anyhow!("Schedule store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Data>> {
        self.data.write().map_err(|_| anyhow!("Schedule store lock poisoned"))
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn read_meta(&self) -> Result<Meta> {
        Ok(self.read()?.meta.clone())
    }

    fn apply_schedule(&self, meta: Meta, mut sessions: Vec<Session>) -> Result<()> {
        sessions.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        let mut data = self.write()?;
        data.meta = meta;
        data.sessions = sessions;
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.read()?.sessions.clone())
    }

    fn replace_shifts(&self, mut shifts: Vec<Shift>) -> Result<()> {
        shifts.sort_by(|a, b| a.start.cmp(&b.start));
        self.write()?.shifts = shifts;
        Ok(())
    }

    fn list_shifts(&self) -> Result<Vec<Shift>> {
        Ok(self.read()?.shifts.clone())
    }

    fn clear(&self) -> Result<()> {
        *self.write()? = Data::default();
        Ok(())
    }
}
