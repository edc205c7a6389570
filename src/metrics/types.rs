use std::collections::BTreeMap;
use std::time::Duration;

/// Status code tracked separately in [`RunReport::succeeded_200`].
pub const STATUS_OK: u16 = 200;

/// Classified result of one request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The exchange completed, whatever the status code.
    Success(u16),
    /// Transport or construction failure; no status was received.
    Failure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub duration: Duration,
    pub total_requests: u64,
    pub succeeded_200: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub errors: u64,
}

impl RunReport {
    /// Requests per second over the run's wall-clock duration, 0 for an
    /// empty duration.
    #[must_use]
    #[expect(clippy::float_arithmetic)]
    pub fn rps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.total_requests as f64 / secs
    }

    /// Requests per second scaled by 100, for fixed two-decimal rendering.
    #[must_use]
    pub fn rps_x100(&self) -> u64 {
        let micros = self.duration.as_micros();
        if micros == 0 {
            return 0;
        }
        let scaled = u128::from(self.total_requests)
            .saturating_mul(100_000_000)
            .checked_div(micros)
            .unwrap_or(0);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    #[must_use]
    pub fn status_total(&self) -> u64 {
        self.status_counts
            .values()
            .fold(0u64, |acc, count| acc.saturating_add(*count))
    }

    /// `total_requests == Σ status_counts + errors`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.total_requests == self.status_total().saturating_add(self.errors)
    }

    /// Adds another report's counters into this one. Durations are left
    /// untouched; the caller stamps the combined wall-clock time.
    pub fn merge(&mut self, other: &RunReport) {
        self.total_requests = self.total_requests.saturating_add(other.total_requests);
        self.succeeded_200 = self.succeeded_200.saturating_add(other.succeeded_200);
        self.errors = self.errors.saturating_add(other.errors);
        for (code, count) in &other.status_counts {
            let entry = self.status_counts.entry(*code).or_insert(0);
            *entry = entry.saturating_add(*count);
        }
    }
}
