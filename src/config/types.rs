use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::args::parse_duration_arg;
use crate::error::ConfigError;

/// Defaults for `run` and `ramp` read from `stress-test.toml` / `.json`.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub method: Option<String>,
    pub headers: Option<Vec<String>>,
    pub body: Option<String>,
    pub timeout: Option<DurationValue>,
    pub output: Option<String>,
    pub out_file: Option<PathBuf>,
    pub requests: Option<u64>,
    pub concurrency: Option<usize>,
    pub ramp: Option<RampConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RampConfig {
    pub steps: Option<u64>,
    pub start_concurrency: Option<usize>,
    pub step_concurrency: Option<usize>,
    pub requests_per_step: Option<u64>,
    pub per_step_duration: Option<DurationValue>,
    pub sleep_between: Option<DurationValue>,
    /// Per-phase timeout; falls back to the top-level `timeout`.
    pub timeout: Option<DurationValue>,
    pub rps: Option<f64>,
    pub step_rps: Option<f64>,
}

/// Either a whole number of seconds or a string such as `"250ms"`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self, field: &'static str) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration_arg(text)
                .map_err(|err| ConfigError::InvalidDuration { field, source: err }),
        }
    }
}
