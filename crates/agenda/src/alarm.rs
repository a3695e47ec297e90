//! Periodic update alarm
//!
//! The alarm keeps firing on its interval until it is discarded or the
//! conference is over. The pipeline re-arms it at the start of every fetch
//! attempt, which restarts the period. How often the alarm fires depends on
//! where "now" falls relative to the conference.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::sync::Trigger;

/// Interval while the conference has not started yet
pub const INTERVAL_BEFORE_CONFERENCE: Duration = Duration::from_secs(24 * 60 * 60);

/// Interval during the conference (and when no time frame is known)
pub const INTERVAL_DURING_CONFERENCE: Duration = Duration::from_secs(2 * 60 * 60);

/// First and last day of the conference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConferenceTimeFrame {
    pub first_day_start: DateTime<Utc>,
    pub last_day_end: DateTime<Utc>,
}

impl ConferenceTimeFrame {
    pub fn new(first_day_start: DateTime<Utc>, last_day_end: DateTime<Utc>) -> Self {
        Self {
            first_day_start,
            last_day_end,
        }
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.first_day_start
    }

    pub fn is_over(&self, now: DateTime<Utc>) -> bool {
        now >= self.last_day_end
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.has_started(now) && !self.is_over(now)
    }
}

/// Delay until the next update, or `None` once the conference is over
pub fn update_interval(
    frame: Option<&ConferenceTimeFrame>,
    now: DateTime<Utc>,
) -> Option<Duration> {
    match frame {
        None => Some(INTERVAL_DURING_CONFERENCE),
        Some(frame) if frame.is_over(now) => None,
        Some(frame) if frame.has_started(now) => Some(INTERVAL_DURING_CONFERENCE),
        Some(_) => Some(INTERVAL_BEFORE_CONFERENCE),
    }
}

/// Scheduler of the next periodic update trigger
pub trait UpdateAlarm: Send + Sync {
    /// Replace any pending alarm with a repeating one. `immediate` fires
    /// right away and then continues on the regular interval.
    fn set_update_alarm(&self, immediate: bool);

    /// Drop any pending alarm
    fn discard_update_alarm(&self);
}

/// Alarm backed by a tokio timer task that sends [`Trigger::Alarm`]
///
/// At most one timer task is running; re-arming aborts the previous one. The
/// task sends a trigger on every tick, recomputing the interval each time.
pub struct TokioUpdateAlarm {
    runtime: Handle,
    triggers: mpsc::UnboundedSender<Trigger>,
    frame: Option<ConferenceTimeFrame>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl TokioUpdateAlarm {
    /// Create an alarm on the current tokio runtime.
    ///
    /// # Panics
    /// When called outside of a tokio runtime.
    pub fn new(
        triggers: mpsc::UnboundedSender<Trigger>,
        frame: Option<ConferenceTimeFrame>,
    ) -> Self {
        Self {
            runtime: Handle::current(),
            triggers,
            frame,
            pending: Mutex::new(None),
        }
    }

    /// Whether a timer is currently armed
    pub fn is_armed(&self) -> bool {
        self.pending
            .lock()
            .map(|p| p.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    fn replace_pending(&self, next: Option<JoinHandle<()>>) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.take() {
                previous.abort();
            }
            *pending = next;
        }
    }
}

impl UpdateAlarm for TokioUpdateAlarm {
    fn set_update_alarm(&self, immediate: bool) {
        let Some(interval) = update_interval(self.frame.as_ref(), Utc::now()) else {
            info!("Conference is over, not scheduling further updates");
            self.replace_pending(None);
            return;
        };

        let delay = if immediate { Duration::ZERO } else { interval };
        debug!("Next schedule update in {:?}", delay);

        let triggers = self.triggers.clone();
        let frame = self.frame;
        let handle = self.runtime.spawn(async move {
            let mut delay = delay;
            loop {
                tokio::time::sleep(delay).await;
                if triggers.send(Trigger::Alarm).is_err() {
                    debug!("Trigger receiver gone, stopping update alarm");
                    return;
                }
                match update_interval(frame.as_ref(), Utc::now()) {
                    Some(next) => delay = next,
                    None => {
                        info!("Conference is over, not scheduling further updates");
                        return;
                    }
                }
            }
        });
        self.replace_pending(Some(handle));
    }

    fn discard_update_alarm(&self) {
        debug!("Discarding update alarm");
        self.replace_pending(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn frame() -> ConferenceTimeFrame {
        ConferenceTimeFrame::new(
            Utc.with_ymd_and_hms(2025, 12, 27, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_interval_without_frame() {
        assert_eq!(update_interval(None, Utc::now()), Some(INTERVAL_DURING_CONFERENCE));
    }

    #[test]
    fn test_interval_before_conference() {
        let now = Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap();
        assert_eq!(update_interval(Some(&frame()), now), Some(INTERVAL_BEFORE_CONFERENCE));
    }

    #[test]
    fn test_interval_during_conference() {
        let now = Utc.with_ymd_and_hms(2025, 12, 28, 12, 0, 0).unwrap();
        assert!(frame().contains(now));
        assert_eq!(update_interval(Some(&frame()), now), Some(INTERVAL_DURING_CONFERENCE));
    }

    #[test]
    fn test_no_interval_after_conference() {
        let now = Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap();
        assert!(frame().is_over(now));
        assert_eq!(update_interval(Some(&frame()), now), None);
    }

    #[tokio::test]
    async fn test_immediate_alarm_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let alarm = TokioUpdateAlarm::new(tx, None);

        alarm.set_update_alarm(true);
        assert_eq!(rx.recv().await, Some(Trigger::Alarm));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_pending_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let alarm = TokioUpdateAlarm::new(tx, None);

        alarm.set_update_alarm(false);
        alarm.set_update_alarm(false);
        assert!(alarm.is_armed());

        tokio::time::advance(INTERVAL_DURING_CONFERENCE + Duration::from_secs(1)).await;
        assert_eq!(rx.recv().await, Some(Trigger::Alarm));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_alarm_repeats_until_discarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let alarm = TokioUpdateAlarm::new(tx, None);

        alarm.set_update_alarm(true);
        assert_eq!(rx.recv().await, Some(Trigger::Alarm));
        assert!(alarm.is_armed());

        for _ in 0..3 {
            tokio::time::advance(INTERVAL_DURING_CONFERENCE).await;
            assert_eq!(rx.recv().await, Some(Trigger::Alarm));
        }

        alarm.discard_update_alarm();
        tokio::time::advance(INTERVAL_DURING_CONFERENCE * 2).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_alarm_stops_when_receiver_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let alarm = TokioUpdateAlarm::new(tx, None);
        drop(rx);

        alarm.set_update_alarm(true);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!alarm.is_armed());
    }

    #[tokio::test]
    async fn test_discard() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let alarm = TokioUpdateAlarm::new(tx, None);

        alarm.set_update_alarm(false);
        alarm.discard_update_alarm();
        assert!(!alarm.is_armed());
    }
}
