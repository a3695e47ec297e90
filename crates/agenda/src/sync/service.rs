//! Host work unit wrapping the update pipeline
//!
//! The host hands each trigger to [`UpdateService::handle_work`] and tears the
//! work down with [`UpdateService::on_destroy`]. The host is told exactly once
//! per call that the work is finished.

use log::{debug, info};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::coordinator::TaskState;
use super::pipeline::SyncPipeline;
use super::{CycleOutcome, Trigger};

/// Host side of a background work unit
pub trait WorkHost: Send + Sync {
    /// The unit of work started by `handle_work` is finished
    fn work_finished(&self, outcome: &CycleOutcome);
}

/// Host that ignores completion, for callers that only want the outcome
pub struct NoopWorkHost;

impl WorkHost for NoopWorkHost {
    fn work_finished(&self, _outcome: &CycleOutcome) {}
}

/// Reports `Cancelled` to the host if the work future is dropped early
struct WorkUnit<'a> {
    host: &'a dyn WorkHost,
    finished: bool,
}

impl WorkUnit<'_> {
    fn finish(mut self, outcome: &CycleOutcome) {
        self.finished = true;
        self.host.work_finished(outcome);
    }
}

impl Drop for WorkUnit<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.host.work_finished(&CycleOutcome::Cancelled);
        }
    }
}

pub struct UpdateService {
    pipeline: SyncPipeline,
}

impl UpdateService {
    pub fn new(pipeline: SyncPipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &SyncPipeline {
        &self.pipeline
    }

    pub fn task_state(&self) -> TaskState {
        self.pipeline.coordinator().state()
    }

    /// Run one cycle for `trigger` and tell `host` when it is done
    pub async fn handle_work(&self, trigger: Trigger, host: &dyn WorkHost) -> CycleOutcome {
        let unit = WorkUnit {
            host,
            finished: false,
        };
        let outcome = self.pipeline.run(trigger).await;
        debug!("Work for {:?} finished: {:?}", trigger, outcome);
        unit.finish(&outcome);
        outcome
    }

    /// Tear down: cancel the running cycle and abort repository loading.
    ///
    /// Safe to call at any time, including when nothing is running.
    pub fn on_destroy(&self) {
        info!("Update service torn down");
        self.pipeline.coordinator().cancel();
        self.pipeline.repository().cancel_loading();
    }

    /// Run `handle_work` on its own task
    pub fn spawn_work(
        self: &Arc<Self>,
        trigger: Trigger,
        host: Arc<dyn WorkHost>,
    ) -> JoinHandle<CycleOutcome> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.handle_work(trigger, host.as_ref()).await })
    }

    /// Consume triggers until the channel closes.
    ///
    /// Each trigger gets its own task, so a trigger arriving while a cycle
    /// runs is dropped by the coordinator instead of waiting in the channel.
    pub async fn run(
        self: Arc<Self>,
        mut triggers: mpsc::UnboundedReceiver<Trigger>,
        host: Arc<dyn WorkHost>,
    ) {
        while let Some(trigger) = triggers.recv().await {
            self.spawn_work(trigger, Arc::clone(&host));
        }
        debug!("Trigger channel closed");
    }
}
