//! Task state of the fetch/parse cycle
//!
//! [`FetchCoordinator`] owns the only piece of shared mutable state in the
//! updater. Every transition goes through its methods and is atomic with
//! respect to concurrent trigger sources.

use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Where the update cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Fetching,
    Parsing,
    /// Teardown was requested; consumed by the next `mark_complete`
    FetchCancelled,
}

#[derive(Debug)]
struct Inner {
    state: TaskState,
    token: Option<CancellationToken>,
}

/// Serializes access to the fetch/parse cycle
#[derive(Debug)]
pub struct FetchCoordinator {
    inner: Mutex<Inner>,
}

impl Default for FetchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: TaskState::Idle,
                token: None,
            }),
        }
    }

    // The state is a plain value that is always consistent, so a poisoned
    // lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> TaskState {
        self.lock().state
    }

    /// Whether a cycle is currently fetching or parsing
    pub fn is_busy(&self) -> bool {
        matches!(self.state(), TaskState::Fetching | TaskState::Parsing)
    }

    /// Whether teardown of the current cycle was requested
    pub fn is_cancelled(&self) -> bool {
        self.state() == TaskState::FetchCancelled
    }

    /// Move `Idle → Fetching` and hand out the cycle's cancellation token.
    ///
    /// Returns `None` when a cycle already owns the work.
    pub fn begin(&self) -> Option<CancellationToken> {
        let mut inner = self.lock();
        if inner.state != TaskState::Idle {
            debug!("Cycle not started, state is {:?}", inner.state);
            return None;
        }
        let token = CancellationToken::new();
        inner.state = TaskState::Fetching;
        inner.token = Some(token.clone());
        Some(token)
    }

    /// Move `Idle → Fetching`; `false` means the caller must abandon its trigger
    pub fn try_start(&self) -> bool {
        self.begin().is_some()
    }

    /// Like [`begin`](Self::begin), but the returned guard completes the
    /// cycle when dropped
    pub fn begin_cycle(self: &Arc<Self>) -> Option<CycleGuard> {
        let token = self.begin()?;
        Some(CycleGuard {
            coordinator: Arc::clone(self),
            token,
            completed: false,
        })
    }

    /// Move `Fetching → Parsing`. Any other state is a no-op.
    pub fn mark_parsing(&self) {
        let mut inner = self.lock();
        match inner.state {
            TaskState::Fetching => inner.state = TaskState::Parsing,
            TaskState::FetchCancelled => {
                debug!("Not parsing, cycle was cancelled");
            }
            state => {
                warn!("mark_parsing called in state {:?}, ignoring", state);
            }
        }
    }

    /// Return to `Idle` from any state
    pub fn mark_complete(&self) {
        let mut inner = self.lock();
        if inner.state != TaskState::Idle {
            debug!("Cycle complete (was {:?})", inner.state);
        }
        inner.state = TaskState::Idle;
        inner.token = None;
    }

    /// Request teardown of the running cycle and abort its network work.
    ///
    /// Nothing happens when no cycle is running.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        match inner.state {
            TaskState::Fetching | TaskState::Parsing => {
                debug!("Cancelling cycle in state {:?}", inner.state);
                inner.state = TaskState::FetchCancelled;
                if let Some(token) = &inner.token {
                    token.cancel();
                }
            }
            TaskState::FetchCancelled | TaskState::Idle => {}
        }
    }
}

/// Completes the cycle it was handed out for, at the latest when dropped
#[derive(Debug)]
pub struct CycleGuard {
    coordinator: Arc<FetchCoordinator>,
    token: CancellationToken,
    completed: bool,
}

impl CycleGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancellation wins once requested, even if the step that is being
    /// processed already finished.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.coordinator.is_cancelled()
    }

    pub fn mark_parsing(&self) {
        self.coordinator.mark_parsing();
    }

    pub fn complete(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.completed {
            self.completed = true;
            self.coordinator.mark_complete();
        }
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        if !self.completed {
            // Abandoned mid-cycle: release any blocking work still running.
            debug!("Cycle dropped before completion");
            self.token.cancel();
        }
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_try_start_from_idle() {
        let coordinator = FetchCoordinator::new();
        assert_eq!(coordinator.state(), TaskState::Idle);
        assert!(coordinator.try_start());
        assert_eq!(coordinator.state(), TaskState::Fetching);
    }

    #[test]
    fn test_second_start_is_refused() {
        let coordinator = FetchCoordinator::new();
        assert!(coordinator.try_start());
        assert!(!coordinator.try_start());

        coordinator.mark_parsing();
        assert!(!coordinator.try_start());
        assert_eq!(coordinator.state(), TaskState::Parsing);
    }

    #[test]
    fn test_full_cycle() {
        let coordinator = FetchCoordinator::new();
        assert!(coordinator.try_start());
        coordinator.mark_parsing();
        assert_eq!(coordinator.state(), TaskState::Parsing);
        coordinator.mark_complete();
        assert_eq!(coordinator.state(), TaskState::Idle);
        assert!(coordinator.try_start());
    }

    #[test]
    fn test_mark_parsing_from_idle_is_noop() {
        let coordinator = FetchCoordinator::new();
        coordinator.mark_parsing();
        assert_eq!(coordinator.state(), TaskState::Idle);
    }

    #[test]
    fn test_cancel_while_fetching() {
        let coordinator = FetchCoordinator::new();
        let token = coordinator.begin().unwrap();

        coordinator.cancel();
        assert!(token.is_cancelled());
        assert_eq!(coordinator.state(), TaskState::FetchCancelled);

        // Not a valid starting point
        assert!(!coordinator.try_start());

        // A late fetch completion must not move on to parsing
        coordinator.mark_parsing();
        assert_eq!(coordinator.state(), TaskState::FetchCancelled);

        coordinator.mark_complete();
        assert_eq!(coordinator.state(), TaskState::Idle);
    }

    #[test]
    fn test_cancel_while_parsing() {
        let coordinator = FetchCoordinator::new();
        let token = coordinator.begin().unwrap();
        coordinator.mark_parsing();

        coordinator.cancel();
        assert!(token.is_cancelled());
        assert_eq!(coordinator.state(), TaskState::FetchCancelled);
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let coordinator = FetchCoordinator::new();
        coordinator.cancel();
        assert_eq!(coordinator.state(), TaskState::Idle);
        assert!(coordinator.try_start());
    }

    #[test]
    fn test_new_cycle_gets_fresh_token() {
        let coordinator = FetchCoordinator::new();
        let first = coordinator.begin().unwrap();
        coordinator.cancel();
        coordinator.mark_complete();

        let second = coordinator.begin().unwrap();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_guard_completes_on_drop() {
        let coordinator = Arc::new(FetchCoordinator::new());
        let token;
        {
            let guard = coordinator.begin_cycle().unwrap();
            guard.mark_parsing();
            assert_eq!(coordinator.state(), TaskState::Parsing);
            token = guard.token().clone();
        }
        assert_eq!(coordinator.state(), TaskState::Idle);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_guard_complete_is_idempotent() {
        let coordinator = Arc::new(FetchCoordinator::new());
        let guard = coordinator.begin_cycle().unwrap();
        guard.complete();
        assert_eq!(coordinator.state(), TaskState::Idle);

        // The next cycle is not disturbed by the finished guard
        let next = coordinator.begin_cycle().unwrap();
        assert_eq!(coordinator.state(), TaskState::Fetching);
        drop(next);
        assert_eq!(coordinator.state(), TaskState::Idle);
    }

    #[test]
    fn test_guard_sees_cancellation() {
        let coordinator = Arc::new(FetchCoordinator::new());
        let guard = coordinator.begin_cycle().unwrap();
        assert!(!guard.is_cancelled());
        coordinator.cancel();
        assert!(guard.is_cancelled());
    }

    #[test]
    fn test_concurrent_starts_admit_one() {
        let coordinator = Arc::new(FetchCoordinator::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                thread::spawn(move || coordinator.try_start())
            })
            .collect();

        let started = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|started| *started)
            .count();
        assert_eq!(started, 1);
        assert_eq!(coordinator.state(), TaskState::Fetching);
    }
}
