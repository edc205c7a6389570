use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::types::{Outcome, RunReport, STATUS_OK};

#[derive(Debug, Default)]
struct Tally {
    issued: u64,
    succeeded_200: u64,
    errors: u64,
    status_counts: BTreeMap<u16, u64>,
}

/// Accumulates outcomes from any number of workers.
///
/// All state sits behind one mutex; callers only see `record_issued`,
/// `record` and the final snapshot. A poisoned lock is recovered, so
/// recording never fails.
#[derive(Debug, Default)]
pub struct Aggregator {
    tally: Mutex<Tally>,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one attempted request. Called before the matching [`Aggregator::record`].
    pub fn record_issued(&self) {
        let mut tally = self.lock();
        tally.issued = tally.issued.saturating_add(1);
    }

    pub fn record(&self, outcome: Outcome) {
        let mut tally = self.lock();
        match outcome {
            Outcome::Success(status) => {
                let entry = tally.status_counts.entry(status).or_insert(0);
                *entry = entry.saturating_add(1);
                if status == STATUS_OK {
                    tally.succeeded_200 = tally.succeeded_200.saturating_add(1);
                }
            }
            Outcome::Failure => {
                tally.errors = tally.errors.saturating_add(1);
            }
        }
    }

    /// Current counters with the given duration stamped on.
    #[must_use]
    pub fn snapshot(&self, duration: Duration) -> RunReport {
        let tally = self.lock();
        RunReport {
            duration,
            total_requests: tally.issued,
            succeeded_200: tally.succeeded_200,
            status_counts: tally.status_counts.clone(),
            errors: tally.errors,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tally> {
        self.tally.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
