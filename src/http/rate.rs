use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::shutdown::ShutdownReceiver;

/// Shortest interval between permits, whatever the requested rate.
pub const MIN_PERMIT_INTERVAL: Duration = Duration::from_micros(1);
/// Permits banked beyond what waiting workers take immediately.
pub const DEFAULT_PERMIT_BACKLOG: usize = 1;

/// Emits one permit every `1s / rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePacer {
    interval: Duration,
    backlog: usize,
}

impl RatePacer {
    /// Returns `None` for a rate that cannot pace anything (zero, negative,
    /// NaN or infinite).
    #[must_use]
    #[expect(clippy::float_arithmetic)]
    pub fn new(rate: f64) -> Option<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return None;
        }
        let interval = Duration::try_from_secs_f64(1.0 / rate).unwrap_or(Duration::MAX);
        Some(Self {
            interval: interval.max(MIN_PERMIT_INTERVAL),
            backlog: DEFAULT_PERMIT_BACKLOG,
        })
    }

    /// Caps how many undrawn permits may accumulate while every worker is
    /// busy. Ticks beyond the cap are dropped. A cap of zero is raised to one.
    #[must_use]
    pub const fn with_backlog(mut self, backlog: usize) -> Self {
        self.backlog = if backlog == 0 { 1 } else { backlog };
        self
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub const fn backlog(&self) -> usize {
        self.backlog
    }

    /// Starts the generator. Permits flow until `deadline` or until the
    /// shutdown signal fires, whichever comes first. Each call yields an
    /// independent source.
    #[must_use]
    pub fn start(&self, deadline: Instant, shutdown: &ShutdownReceiver) -> Permits {
        let semaphore = Arc::new(Semaphore::new(0));
        let waiting = Arc::new(AtomicUsize::new(0));
        let generator = tokio::spawn(generate_permits(
            Arc::clone(&semaphore),
            Arc::clone(&waiting),
            *self,
            deadline,
            shutdown.clone(),
        ));
        Permits {
            semaphore,
            waiting,
            generator,
        }
    }
}

/// Running permit source. Dropping it stops the generator.
#[derive(Debug)]
pub struct Permits {
    semaphore: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
    generator: JoinHandle<()>,
}

impl Permits {
    /// Waits for the next permit. Returns `false` once the source has stopped
    /// or the shutdown signal fires.
    pub async fn acquire(&self, shutdown: &mut ShutdownReceiver) -> bool {
        let _waiter = Waiter::enter(&self.waiting);
        tokio::select! {
            biased;
            () = shutdown.triggered() => false,
            permit = self.semaphore.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    true
                }
                Err(_closed) => false,
            },
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    #[cfg(test)]
    pub(crate) fn banked(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Counts a worker parked in `acquire` for as long as it waits.
struct Waiter<'count>(&'count AtomicUsize);

impl<'count> Waiter<'count> {
    fn enter(count: &'count AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self(count)
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Drop for Permits {
    fn drop(&mut self) {
        self.semaphore.close();
        self.generator.abort();
    }
}

async fn generate_permits(
    semaphore: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
    pacer: RatePacer,
    deadline: Instant,
    mut shutdown: ShutdownReceiver,
) {
    let mut granted: u64 = 0;
    let mut dropped: u64 = 0;
    let mut next_due = Instant::now().checked_add(pacer.interval);

    while let Some(due) = next_due {
        tokio::select! {
            biased;
            () = shutdown.triggered() => break,
            () = sleep_until(deadline) => break,
            () = sleep_until(due) => {
                // Ticks due within one timer wake fire back to back. Workers
                // parked in `acquire` may not have drawn yet, so they widen
                // the cap. A dropped tick keeps the cadence.
                let cap = pacer.backlog.saturating_add(waiting.load(Ordering::Acquire));
                if semaphore.available_permits() < cap {
                    semaphore.add_permits(1);
                    granted = granted.saturating_add(1);
                } else {
                    dropped = dropped.saturating_add(1);
                }
                next_due = due.checked_add(pacer.interval);
            }
        }
    }

    semaphore.close();
    debug!(granted, dropped, "Rate pacer stopped");
}
