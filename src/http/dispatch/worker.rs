use std::sync::Arc;

use tracing::trace;
use url::Url;

use crate::metrics::{Aggregator, Outcome};
use crate::shutdown::ShutdownReceiver;

use super::super::issuer::{Transport, issue};
use super::super::spec::RequestSpec;
use super::gate::WorkGate;

pub(super) struct WorkerContext<T: ?Sized> {
    pub(super) id: usize,
    pub(super) transport: Arc<T>,
    pub(super) target: Arc<Url>,
    pub(super) spec: Arc<RequestSpec>,
    pub(super) gate: WorkGate,
    pub(super) aggregator: Arc<Aggregator>,
    pub(super) shutdown: ShutdownReceiver,
}

/// Issues requests until the gate refuses. Returns how many this worker sent.
pub(super) async fn run_worker<T>(mut worker: WorkerContext<T>) -> u64
where
    T: Transport + ?Sized,
{
    let mut issued: u64 = 0;
    while worker.gate.admit(&mut worker.shutdown).await {
        let pending = PendingOutcome::open(&worker.aggregator);
        issued = issued.saturating_add(1);
        let outcome = issue(
            worker.transport.as_ref(),
            &worker.target,
            &worker.spec,
            &mut worker.shutdown,
        )
        .await;
        pending.settle(outcome);
        if outcome == Outcome::Failure {
            // Fast failures may never hit a suspension point; let other
            // tasks (and the signal handler) run.
            tokio::task::yield_now().await;
        }
    }
    trace!(worker = worker.id, issued, "Worker exiting");
    issued
}

/// An issued request whose outcome is not recorded yet. If the worker unwinds
/// before settling, the attempt is recorded as a failure.
struct PendingOutcome<'agg> {
    aggregator: &'agg Aggregator,
    settled: bool,
}

impl<'agg> PendingOutcome<'agg> {
    fn open(aggregator: &'agg Aggregator) -> Self {
        aggregator.record_issued();
        Self {
            aggregator,
            settled: false,
        }
    }

    fn settle(mut self, outcome: Outcome) {
        self.settled = true;
        self.aggregator.record(outcome);
    }
}

impl Drop for PendingOutcome<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.aggregator.record(Outcome::Failure);
        }
    }
}
