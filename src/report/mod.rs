//! Text and JSON rendering of run reports.
mod json;
mod output;
mod text;


pub use json::{PhaseJson, RampSummaryJson, RunSummaryJson, StatsJson, render_json, timestamp_now};
pub use output::emit;
pub use text::{
    format_compact_duration, format_rps, render_phase_line, render_ramp_text, render_run_text,
};
