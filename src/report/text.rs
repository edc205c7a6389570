use std::fmt;
use std::time::Duration;

use crate::metrics::{RunReport, STATUS_OK};

/// `12345` requests/sec x100 renders as `123.45`.
#[must_use]
pub fn format_rps(report: &RunReport) -> String {
    let rps_x100 = report.rps_x100();
    format!("{}.{:02}", rps_x100 / 100, rps_x100 % 100)
}

/// Renders a duration as `1h2m3.5s`, `1m30s`, `15s`, `300ms`, `1.5\u{b5}s` or
/// `250ns`. Minutes appear from one minute up, hours from one hour up.
#[must_use]
pub fn format_compact_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_owned();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}\u{b5}s", decimal(nanos, 3));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", decimal(nanos, 6));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3_600;
    let minutes = (total_secs / 60) % 60;
    let hours_part = if hours > 0 {
        format!("{}h", hours)
    } else {
        String::new()
    };
    let minutes_part = if total_secs >= 60 {
        format!("{}m", minutes)
    } else {
        String::new()
    };
    format!(
        "{}{}{}s",
        hours_part,
        minutes_part,
        decimal(nanos % 60_000_000_000, 9)
    )
}

/// `value` scaled down by `10^digits`, without trailing fractional zeros.
fn decimal(value: u128, digits: u32) -> String {
    let scale = 10_u128.checked_pow(digits).unwrap_or(1);
    let whole = value.checked_div(scale).unwrap_or(value);
    let fraction = value.checked_rem(scale).unwrap_or(0);
    if fraction == 0 {
        return whole.to_string();
    }
    let width = usize::try_from(digits).unwrap_or(0);
    let rendered = format!("{}.{:0width$}", whole, fraction, width = width);
    rendered.trim_end_matches('0').to_owned()
}

#[must_use]
pub fn render_run_text(report: &RunReport) -> String {
    RunText(report).to_string()
}

/// One line per finished ramp phase; `phase` is 1-based.
#[must_use]
pub fn render_phase_line(phase: u64, report: &RunReport) -> String {
    format!(
        "Phase {}: time={}, rps={}, http200={}, errors={}",
        phase,
        format_compact_duration(report.duration),
        format_rps(report),
        report.succeeded_200,
        report.errors
    )
}

/// The overall ramp summary printed after the phase lines.
#[must_use]
pub fn render_ramp_text(overall: &RunReport) -> String {
    RampText(overall).to_string()
}

struct RunText<'report>(&'report RunReport);

impl fmt::Display for RunText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total time: {}", format_compact_duration(self.0.duration))?;
        writeln!(f, "Total requests: {}", self.0.total_requests)?;
        writeln!(f, "Requests/sec: {}", format_rps(self.0))?;
        write_counts(f, self.0)
    }
}

struct RampText<'report>(&'report RunReport);

impl fmt::Display for RampText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f, "Overall time: {}", format_compact_duration(self.0.duration))?;
        writeln!(f, "Total requests: {}", self.0.total_requests)?;
        writeln!(f, "Overall RPS: {}", format_rps(self.0))?;
        write_counts(f, self.0)
    }
}

fn write_counts(f: &mut fmt::Formatter<'_>, report: &RunReport) -> fmt::Result {
    writeln!(f, "HTTP 200: {}", report.succeeded_200)?;
    let mut others = report
        .status_counts
        .iter()
        .filter(|(code, _)| **code != STATUS_OK)
        .peekable();
    if others.peek().is_some() {
        writeln!(f, "Other status codes:")?;
        for (code, count) in others {
            writeln!(f, "- {}: {}", code, count)?;
        }
    }
    if report.errors > 0 {
        writeln!(f, "Errors: {}", report.errors)?;
    }
    Ok(())
}
