//! SQLite-based schedule storage

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use rusqlite_migration::{M, Migrations};

use super::ScheduleStore;
use crate::models::{Meta, Session, SessionId, Shift};

/// Database migrations
///
/// Applied in order; the user_version pragma tracks progress.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        // Migration 1: Initial schema
        M::up(
            r#"
            -- Metadata of the applied schedule (single row)
            CREATE TABLE meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version TEXT NOT NULL,
                title TEXT NOT NULL,
                num_days INTEGER NOT NULL,
                etag TEXT NOT NULL
            );

            CREATE TABLE sessions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                subtitle TEXT NOT NULL,
                day INTEGER NOT NULL,
                room TEXT NOT NULL,
                start_at TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                speakers TEXT NOT NULL DEFAULT '[]',  -- JSON array
                is_new INTEGER NOT NULL DEFAULT 0,
                is_canceled INTEGER NOT NULL DEFAULT 0,
                changed_title INTEGER NOT NULL DEFAULT 0,
                changed_time INTEGER NOT NULL DEFAULT 0,
                changed_day INTEGER NOT NULL DEFAULT 0,
                changed_room INTEGER NOT NULL DEFAULT 0,
                changed_duration INTEGER NOT NULL DEFAULT 0,
                changed_speakers INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_sessions_start_at ON sessions(start_at ASC, id ASC);
            "#,
        ),
        // Migration 2: Volunteer shifts
        M::up(
            r#"
            CREATE TABLE shifts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                room TEXT NOT NULL,
                start_at TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL
            );
            "#,
        ),
    ])
}

const SESSION_COLUMNS: &str = "id, title, subtitle, day, room, start_at, duration_minutes, speakers,
     is_new, is_canceled, changed_title, changed_time, changed_day, changed_room,
     changed_duration, changed_speakers";

/// Raw session columns, converted outside the row callback
struct SessionRow {
    id: String,
    title: String,
    subtitle: String,
    day: u32,
    room: String,
    start_at: String,
    duration_minutes: u32,
    speakers: String,
    flags: [bool; 8],
}

impl SessionRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let mut flags = [false; 8];
        for (i, flag) in flags.iter_mut().enumerate() {
            *flag = row.get(8 + i)?;
        }
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            subtitle: row.get(2)?,
            day: row.get(3)?,
            room: row.get(4)?,
            start_at: row.get(5)?,
            duration_minutes: row.get(6)?,
            speakers: row.get(7)?,
            flags,
        })
    }

    fn into_session(self) -> Result<Session> {
        let [
            is_new,
            is_canceled,
            changed_title,
            changed_time,
            changed_day,
            changed_room,
            changed_duration,
            changed_speakers,
        ] = self.flags;

        Ok(Session {
            id: SessionId::new(self.id),
            title: self.title,
            subtitle: self.subtitle,
            day: self.day,
            room: self.room,
            start: parse_timestamp(&self.start_at)?,
            duration_minutes: self.duration_minutes,
            speakers: serde_json::from_str(&self.speakers)
                .context("Failed to decode session speakers")?,
            is_new,
            is_canceled,
            changed_title,
            changed_time,
            changed_day,
            changed_room,
            changed_duration,
            changed_speakers,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp '{}'", value))?
        .with_timezone(&Utc))
}

/// SQLite-based schedule storage
pub struct SqliteScheduleStore {
    conn: Mutex<Connection>,
}

impl SqliteScheduleStore {
    /// Open (or create) the database at `db_path` and run migrations
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open database at {:?}", db_path.as_ref()))?;

        // WAL lets the UI read while a background update writes.
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            "#,
        )?;

        migrations()
            .to_latest(&mut conn)
            .context("Failed to run database migrations")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Database connection lock poisoned"))
    }

    fn query_sessions(&self, filter: &str) -> Result<Vec<Session>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sessions {} ORDER BY start_at ASC, id ASC",
            SESSION_COLUMNS, filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], SessionRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn read_meta(&self) -> Result<Meta> {
        let conn = self.conn()?;
        let meta = conn
            .query_row(
                "SELECT version, title, num_days, etag FROM meta WHERE id = 1",
                [],
                |row| {
                    Ok(Meta {
                        version: row.get(0)?,
                        title: row.get(1)?,
                        num_days: row.get(2)?,
                        etag: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(meta.unwrap_or_default())
    }

    fn apply_schedule(&self, meta: Meta, sessions: Vec<Session>) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO meta (id, version, title, num_days, etag)
             VALUES (1, ?, ?, ?, ?)",
            params![meta.version, meta.title, meta.num_days, meta.etag],
        )?;

        tx.execute("DELETE FROM sessions", [])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO sessions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                SESSION_COLUMNS
            ))?;
            for s in &sessions {
                stmt.execute(params![
                    s.id.as_str(),
                    s.title,
                    s.subtitle,
                    s.day,
                    s.room,
                    s.start.to_rfc3339(),
                    s.duration_minutes,
                    serde_json::to_string(&s.speakers)?,
                    s.is_new,
                    s.is_canceled,
                    s.changed_title,
                    s.changed_time,
                    s.changed_day,
                    s.changed_room,
                    s.changed_duration,
                    s.changed_speakers,
                ])?;
            }
        }

        tx.commit().context("Failed to commit schedule")?;
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<Session>> {
        self.query_sessions("")
    }

    fn list_changed_sessions(&self) -> Result<Vec<Session>> {
        self.query_sessions(
            "WHERE is_new OR is_canceled OR changed_title OR changed_time OR changed_day
                OR changed_room OR changed_duration OR changed_speakers",
        )
    }

    fn replace_shifts(&self, shifts: Vec<Shift>) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM shifts", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO shifts (id, title, room, start_at, duration_minutes)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            for shift in &shifts {
                stmt.execute(params![
                    shift.id,
                    shift.title,
                    shift.room,
                    shift.start.to_rfc3339(),
                    shift.duration_minutes,
                ])?;
            }
        }
        tx.commit().context("Failed to commit shifts")?;
        Ok(())
    }

    fn list_shifts(&self) -> Result<Vec<Shift>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, room, start_at, duration_minutes FROM shifts
             ORDER BY start_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, u32>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, title, room, start_at, duration_minutes)| {
                Ok(Shift {
                    id,
                    title,
                    room,
                    start: parse_timestamp(&start_at)?,
                    duration_minutes,
                })
            })
            .collect()
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            DELETE FROM meta;
            DELETE FROM sessions;
            DELETE FROM shifts;
            "#,
        )?;
        Ok(())
    }
}
