//! Results handed from the repository to the update pipeline
//!
//! Each value is produced once per cycle, consumed once, then dropped.

use crate::net::HttpOutcome;

/// Downloaded schedule document together with its ETag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSchedule {
    pub document: String,
    pub etag: String,
}

/// Result of one network attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub outcome: HttpOutcome,
    /// Host of the requested URL, for diagnostics
    pub host_name: String,
    /// Underlying error text for failures, empty otherwise
    pub exception_message: String,
    /// Present iff `outcome` is `Ok`
    pub payload: Option<FetchedSchedule>,
}

impl FetchResult {
    pub fn ok(host_name: impl Into<String>, document: String, etag: String) -> Self {
        Self {
            outcome: HttpOutcome::Ok,
            host_name: host_name.into(),
            exception_message: String::new(),
            payload: Some(FetchedSchedule { document, etag }),
        }
    }

    pub fn not_modified(host_name: impl Into<String>) -> Self {
        Self {
            outcome: HttpOutcome::NotModified,
            host_name: host_name.into(),
            exception_message: String::new(),
            payload: None,
        }
    }

    /// A failed attempt; `outcome` must not be `Ok`
    pub fn failure(
        outcome: HttpOutcome,
        host_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        debug_assert!(!outcome.is_successful());
        Self {
            outcome,
            host_name: host_name.into(),
            exception_message: message.into(),
            payload: None,
        }
    }
}

/// Outcome of parsing a fetched document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    Schedule { version: String, success: bool },
    Shifts { success: bool },
}

impl ParseResult {
    pub fn is_success(&self) -> bool {
        match self {
            ParseResult::Schedule { success, .. } | ParseResult::Shifts { success } => *success,
        }
    }

    /// Version label, only for schedule results
    pub fn version(&self) -> Option<&str> {
        match self {
            ParseResult::Schedule { version, .. } => Some(version),
            ParseResult::Shifts { .. } => None,
        }
    }
}
