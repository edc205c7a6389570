use std::time::Duration;

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("stress-test/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_CONCURRENCY: usize = 10;
pub(crate) const DEFAULT_TIMEOUT: &str = "60s";

pub(crate) const DEFAULT_RAMP_STEPS: u64 = 3;
pub(crate) const DEFAULT_RAMP_START_CONCURRENCY: usize = 5;
pub(crate) const DEFAULT_RAMP_STEP_CONCURRENCY: usize = 5;
/// Used only when no per-step duration is configured.
pub(crate) const DEFAULT_RAMP_REQUESTS_PER_STEP: u64 = 100;

pub(crate) const CURL_TIMEOUT: Duration = Duration::from_secs(60);
