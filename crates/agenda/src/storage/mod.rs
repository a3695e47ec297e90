//! Storage traits and implementations
//!
//! The trait-based design allows swapping between the in-memory store used
//! by tests and the SQLite store used on devices.

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryScheduleStore;
pub use sqlite::SqliteScheduleStore;
pub use traits::ScheduleStore;
