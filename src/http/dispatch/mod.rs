mod gate;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::error::AppResult;
use crate::metrics::{Aggregator, RunReport};
use crate::shutdown::ShutdownReceiver;

use super::client::ClientSettings;
use super::issuer::{ReqwestTransport, Transport};
use super::rate::{DEFAULT_PERMIT_BACKLOG, RatePacer};
use super::spec::RequestSpec;
use gate::{TicketSupply, WorkGate};
use worker::{WorkerContext, run_worker};

/// Upper bound on a run's deadline offset, so `Instant` arithmetic stays valid.
const MAX_RUN_DURATION: Duration = Duration::from_secs(3_153_600_000);

/// How a run decides when to stop issuing requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutionPolicy {
    /// Exactly `total` requests, spread over the workers.
    Count { total: u64 },
    /// Back-to-back requests until `duration` has elapsed.
    Duration { duration: Duration },
    /// At most `rate` requests per second until `duration` has elapsed.
    Paced { duration: Duration, rate: f64 },
}

/// Drives a pool of workers through one run.
///
/// `run` consumes the dispatcher: a run goes Idle, Dispatching, Draining and
/// Finalized exactly once.
pub struct Dispatcher<T: ?Sized> {
    transport: Arc<T>,
    target: Arc<Url>,
    spec: Arc<RequestSpec>,
    shutdown: ShutdownReceiver,
    concurrency: usize,
    pacer_backlog: usize,
}

impl<T> Dispatcher<T>
where
    T: Transport + ?Sized + 'static,
{
    /// A concurrency of zero is raised to one.
    #[must_use]
    pub fn new(
        transport: Arc<T>,
        target: &Url,
        spec: &RequestSpec,
        shutdown: &ShutdownReceiver,
        concurrency: usize,
    ) -> Self {
        Self {
            transport,
            target: Arc::new(target.clone()),
            spec: Arc::new(spec.clone()),
            shutdown: shutdown.clone(),
            concurrency: concurrency.max(1),
            pacer_backlog: DEFAULT_PERMIT_BACKLOG,
        }
    }

    /// Permits the pacer may bank while every worker is busy.
    #[must_use]
    pub const fn with_pacer_backlog(mut self, backlog: usize) -> Self {
        self.pacer_backlog = backlog;
        self
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs to completion and returns the frozen report. Per-request failures
    /// are counted, never returned.
    pub async fn run(self, policy: ExecutionPolicy) -> RunReport {
        let aggregator = Arc::new(Aggregator::new());
        let started = Instant::now();

        let gate = match policy {
            ExecutionPolicy::Count { total: 0 } => {
                debug!("No requests to dispatch");
                return aggregator.snapshot(Duration::ZERO);
            }
            ExecutionPolicy::Count { total } => {
                WorkGate::Tickets(Arc::new(TicketSupply::new(total)))
            }
            ExecutionPolicy::Duration { duration } => {
                WorkGate::Deadline(deadline_after(started, duration))
            }
            ExecutionPolicy::Paced { duration, rate } => {
                let Some(pacer) = RatePacer::new(rate) else {
                    debug!(rate, "Target rate admits no requests");
                    return aggregator.snapshot(Duration::ZERO);
                };
                let pacer = pacer.with_backlog(self.pacer_backlog);
                debug!(
                    interval_us = pacer.interval().as_micros(),
                    backlog = pacer.backlog(),
                    "Starting rate pacer"
                );
                WorkGate::Permits(Arc::new(
                    pacer.start(deadline_after(started, duration), &self.shutdown),
                ))
            }
        };

        debug!(
            url = %self.target,
            method = %self.spec.method(),
            workers = self.concurrency,
            ?policy,
            "Dispatching"
        );
        let mut worker_handles = Vec::with_capacity(self.concurrency);
        for id in 0..self.concurrency {
            let worker = WorkerContext {
                id,
                transport: Arc::clone(&self.transport),
                target: Arc::clone(&self.target),
                spec: Arc::clone(&self.spec),
                gate: gate.clone(),
                aggregator: Arc::clone(&aggregator),
                shutdown: self.shutdown.clone(),
            };
            worker_handles.push(tokio::spawn(run_worker(worker)));
        }

        debug!("Draining workers");
        for handle in worker_handles {
            if let Err(err) = handle.await {
                warn!("Worker terminated abnormally: {}", err);
            }
        }
        drop(gate);

        let report = aggregator.snapshot(started.elapsed());
        debug!(
            total = report.total_requests,
            errors = report.errors,
            elapsed_ms = report.duration.as_millis(),
            "Run finalized"
        );
        report
    }
}

fn deadline_after(started: Instant, duration: Duration) -> Instant {
    started
        .checked_add(duration.min(MAX_RUN_DURATION))
        .unwrap_or(started)
}

/// Runs `policy` against `target` through a caller-supplied transport.
pub async fn dispatch<T>(
    transport: Arc<T>,
    target: &Url,
    spec: &RequestSpec,
    shutdown: &ShutdownReceiver,
    policy: ExecutionPolicy,
    concurrency: usize,
) -> RunReport
where
    T: Transport + ?Sized + 'static,
{
    Dispatcher::new(transport, target, spec, shutdown, concurrency)
        .run(policy)
        .await
}

async fn dispatch_over_reqwest(
    shutdown: &ShutdownReceiver,
    target: &Url,
    spec: &RequestSpec,
    policy: ExecutionPolicy,
    concurrency: usize,
) -> AppResult<RunReport> {
    // One pool per invocation, dropped with the transport when the run ends.
    let transport = Arc::new(ReqwestTransport::new(&ClientSettings::default())?);
    Ok(dispatch(transport, target, spec, shutdown, policy, concurrency).await)
}

/// Sends exactly `total_requests` requests over `concurrency` workers.
///
/// # Errors
///
/// Returns an error only when the HTTP client cannot be built.
pub async fn run_count(
    shutdown: &ShutdownReceiver,
    target: &Url,
    spec: &RequestSpec,
    total_requests: u64,
    concurrency: usize,
) -> AppResult<RunReport> {
    if total_requests == 0 {
        return Ok(RunReport::default());
    }
    dispatch_over_reqwest(
        shutdown,
        target,
        spec,
        ExecutionPolicy::Count {
            total: total_requests,
        },
        concurrency,
    )
    .await
}

/// Sends requests back to back until `duration` has elapsed. Requests in
/// flight at the deadline are allowed to finish.
///
/// # Errors
///
/// Returns an error only when the HTTP client cannot be built.
pub async fn run_duration(
    shutdown: &ShutdownReceiver,
    target: &Url,
    spec: &RequestSpec,
    duration: Duration,
    concurrency: usize,
) -> AppResult<RunReport> {
    dispatch_over_reqwest(
        shutdown,
        target,
        spec,
        ExecutionPolicy::Duration { duration },
        concurrency,
    )
    .await
}

/// Like [`run_duration`], but no faster than `target_rate` requests per
/// second. A non-positive rate returns an empty report straight away.
///
/// # Errors
///
/// Returns an error only when the HTTP client cannot be built.
pub async fn run_duration_at_rate(
    shutdown: &ShutdownReceiver,
    target: &Url,
    spec: &RequestSpec,
    duration: Duration,
    concurrency: usize,
    target_rate: f64,
) -> AppResult<RunReport> {
    if RatePacer::new(target_rate).is_none() {
        return Ok(RunReport::default());
    }
    dispatch_over_reqwest(
        shutdown,
        target,
        spec,
        ExecutionPolicy::Paced {
            duration,
            rate: target_rate,
        },
        concurrency,
    )
    .await
}
