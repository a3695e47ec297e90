//! Domain models for schedule entities

mod meta;
mod results;
mod session;
mod shift;

pub use meta::Meta;
pub use results::{FetchResult, FetchedSchedule, ParseResult};
pub use session::{ChangeStatistic, Session, SessionId};
pub use shift::Shift;
