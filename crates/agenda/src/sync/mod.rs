//! Background schedule synchronization
//!
//! One update cycle runs gate → fetch → parse → notify. At most one cycle is
//! in flight at a time; triggers that arrive while a cycle runs are dropped.

mod connectivity;
mod coordinator;
mod pipeline;
mod service;

pub use connectivity::{
    ConnectivityGate, ConnectivityMonitor, ManualConnectivity, Reachability, TcpProbe,
};
pub use coordinator::{CycleGuard, FetchCoordinator, TaskState};
pub use pipeline::SyncPipeline;
pub use service::{NoopWorkHost, UpdateService, WorkHost};

use crate::net::HttpOutcome;

/// What started an update cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The periodic update alarm fired
    Alarm,
    /// The user asked for a refresh
    Manual,
    /// The app was launched
    AppStart,
}

/// How an update cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was already running; this trigger was dropped
    Dropped,
    /// No network; nothing was started
    NoConnectivity,
    /// The download failed with a non-success outcome
    FetchFailed(HttpOutcome),
    /// The server reported the schedule unchanged
    NotModified,
    /// The cycle was torn down before it finished
    Cancelled,
    /// The document was downloaded and parsed
    Completed {
        version: String,
        success: bool,
        changed: usize,
        notified: bool,
    },
}

impl CycleOutcome {
    /// Whether a fetch/parse cycle was actually started
    pub fn started(&self) -> bool {
        !matches!(self, CycleOutcome::Dropped | CycleOutcome::NoConnectivity)
    }
}
