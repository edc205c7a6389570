use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::AppResult;
use crate::metrics::RunReport;

/// Counters shared by every JSON summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsJson {
    pub duration_ms: u64,
    pub total_requests: u64,
    pub rps: f64,
    pub http_200: u64,
    pub errors: u64,
    pub status_counts: BTreeMap<String, u64>,
}

impl From<&RunReport> for StatsJson {
    fn from(report: &RunReport) -> Self {
        Self {
            duration_ms: u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            total_requests: report.total_requests,
            rps: report.rps(),
            http_200: report.succeeded_200,
            errors: report.errors,
            status_counts: report
                .status_counts
                .iter()
                .map(|(code, count)| (code.to_string(), *count))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummaryJson {
    pub url: String,
    pub method: String,
    #[serde(flatten)]
    pub stats: StatsJson,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseJson {
    /// 1-based phase number.
    pub phase: u64,
    pub concurrency: usize,
    /// Target rate; absent for unpaced phases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(flatten)]
    pub stats: StatsJson,
}

#[derive(Debug, Clone, Serialize)]
pub struct RampSummaryJson {
    pub url: String,
    pub method: String,
    pub steps: u64,
    pub start_concurrency: usize,
    pub step_concurrency: usize,
    /// `requests`, `duration` or `duration+rate`.
    pub mode: String,
    /// Requests (`"100"`) or duration (`"10s"`) per phase.
    pub per_step: String,
    #[serde(flatten)]
    pub stats: StatsJson,
    pub timestamp: String,
    pub phases: Vec<PhaseJson>,
}

/// Current UTC time as RFC 3339 with second precision.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Pretty-printed JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn render_json<T: Serialize>(summary: &T) -> AppResult<String> {
    let mut rendered = serde_json::to_string_pretty(summary)?;
    rendered.push('\n');
    Ok(rendered)
}
