use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use url::Url;

use crate::args::parsers::{ensure_non_negative, ensure_positive_u64, ensure_positive_usize};
use crate::args::{DEFAULT_RAMP_REQUESTS_PER_STEP, OutputFormat, RampArgs, parse_target_url};
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::{RequestSpec, run_count, run_duration, run_duration_at_rate};
use crate::metrics::RunReport;
use crate::report::{self, PhaseJson, RampSummaryJson, StatsJson, format_compact_duration};
use crate::shutdown::{ShutdownReceiver, ShutdownSender, shutdown_channel};
use crate::shutdown_handlers::{forward_shutdown, setup_deadline_shutdown};

use super::run::build_request_spec;

/// What bounds a single phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhaseBudget {
    Requests(u64),
    Duration(Duration),
}

/// A validated `ramp` invocation.
#[derive(Debug)]
pub(crate) struct RampPlan {
    pub url: Url,
    pub spec: RequestSpec,
    pub steps: u64,
    pub start_concurrency: usize,
    pub step_concurrency: usize,
    pub budget: PhaseBudget,
    pub rps: f64,
    pub step_rps: f64,
    pub sleep_between: Option<Duration>,
    /// Applies to each phase separately.
    pub timeout: Duration,
    pub format: OutputFormat,
    pub out_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Phase {
    /// 1-based.
    pub number: u64,
    pub concurrency: usize,
    /// Set only for paced duration phases.
    pub rate: Option<f64>,
}

impl RampPlan {
    pub(crate) fn from_args(args: &RampArgs) -> AppResult<Self> {
        let url = parse_target_url(args.url.as_deref().unwrap_or_default())?;
        let steps = ensure_positive_u64(args.steps, "steps")?;
        let start_concurrency = ensure_positive_usize(args.start_concurrency, "start-concurrency")?;
        let rps = ensure_non_negative(args.rps, "rps")?;
        let step_rps = ensure_non_negative(args.step_rps, "step-rps")?;
        if args.timeout.is_zero() {
            return Err(AppError::validation(ValidationError::MustBePositive {
                flag: "timeout",
            }));
        }
        let per_step_duration = args.per_step_duration.filter(|duration| !duration.is_zero());
        let budget = select_budget(args.requests_per_step, per_step_duration, rps)?;

        Ok(Self {
            url,
            spec: build_request_spec(&args.request)?,
            steps,
            start_concurrency,
            step_concurrency: args.step_concurrency,
            budget,
            rps,
            step_rps,
            sleep_between: args.sleep_between.filter(|pause| !pause.is_zero()),
            timeout: args.timeout,
            format: args.output.format,
            out_file: args.output.out_file.clone(),
        })
    }

    fn is_paced(&self) -> bool {
        self.rps > 0.0 || self.step_rps > 0.0
    }

    pub(crate) fn mode(&self) -> &'static str {
        match self.budget {
            PhaseBudget::Requests(_) => "requests",
            PhaseBudget::Duration(_) if self.is_paced() => "duration+rate",
            PhaseBudget::Duration(_) => "duration",
        }
    }

    pub(crate) fn per_step(&self) -> String {
        match self.budget {
            PhaseBudget::Requests(total) => format!("requests_per_step={}", total),
            PhaseBudget::Duration(duration) if self.is_paced() => format!(
                "per_step_duration={},rps_start={:.2},step_rps={:.2}",
                format_compact_duration(duration),
                self.rps,
                self.step_rps
            ),
            PhaseBudget::Duration(duration) => {
                format!("per_step_duration={}", format_compact_duration(duration))
            }
        }
    }

    /// Phase `index` (0-based) runs `start + index * step` workers at
    /// `rps + index * step_rps`.
    #[expect(clippy::float_arithmetic)]
    pub(crate) fn phase(&self, index: u64) -> Phase {
        let offset = usize::try_from(index).unwrap_or(usize::MAX);
        let concurrency = self
            .start_concurrency
            .saturating_add(self.step_concurrency.saturating_mul(offset));
        let rate = match self.budget {
            PhaseBudget::Requests(_) => None,
            PhaseBudget::Duration(_) => {
                Some(self.rps + index as f64 * self.step_rps).filter(|rate| *rate > 0.0)
            }
        };
        Phase {
            number: index.saturating_add(1),
            concurrency,
            rate,
        }
    }
}

fn select_budget(
    requests_per_step: Option<u64>,
    per_step_duration: Option<Duration>,
    rps: f64,
) -> AppResult<PhaseBudget> {
    let requests = requests_per_step.unwrap_or(if per_step_duration.is_none() {
        DEFAULT_RAMP_REQUESTS_PER_STEP
    } else {
        0
    });
    if requests > 0 {
        if per_step_duration.is_some() || rps > 0.0 {
            return Err(AppError::validation(
                ValidationError::RampRequestsModeConflict,
            ));
        }
        return Ok(PhaseBudget::Requests(requests));
    }
    per_step_duration
        .map(PhaseBudget::Duration)
        .ok_or_else(|| AppError::validation(ValidationError::RampModeMissing))
}

struct Progress<'plan> {
    plan: &'plan RampPlan,
    phase: &'plan Phase,
}

impl fmt::Display for Progress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Phase {}/{}: concurrency={}",
            self.phase.number, self.plan.steps, self.phase.concurrency
        )?;
        match self.plan.budget {
            PhaseBudget::Requests(total) => write!(f, ", requests={}", total)?,
            PhaseBudget::Duration(duration) => {
                write!(f, ", duration={}", format_compact_duration(duration))?;
            }
        }
        if let Some(rate) = self.phase.rate {
            write!(f, ", rate={:.2} rps", rate)?;
        }
        Ok(())
    }
}

/// Runs every phase in order, then renders per-phase and overall results.
pub(crate) async fn run_ramp(plan: &RampPlan, shutdown_tx: &ShutdownSender) -> AppResult<()> {
    let shutdown_rx = shutdown_tx.subscribe();
    let print_phases = plan.format == OutputFormat::Text && plan.out_file.is_none();
    info!(
        "Ramping {} over {} phases in {} mode",
        plan.url,
        plan.steps,
        plan.mode()
    );

    let started = Instant::now();
    let mut overall = RunReport::default();
    let mut finished: Vec<(Phase, RunReport)> = Vec::new();
    for index in 0..plan.steps {
        if shutdown_rx.is_triggered() {
            warn!("Ramp cancelled; skipping the remaining phases");
            break;
        }
        let phase = plan.phase(index);
        let progress = Progress {
            plan,
            phase: &phase,
        };
        eprintln!("{}", progress);

        let report = run_phase(plan, &phase, &shutdown_rx).await?;
        if print_phases {
            println!("{}", report::render_phase_line(phase.number, &report));
        }
        overall.merge(&report);
        finished.push((phase, report));

        if let Some(pause) = plan.sleep_between
            && phase.number < plan.steps
        {
            debug!("Sleeping {:?} before the next phase", pause);
            let mut pause_rx = shutdown_rx.clone();
            tokio::select! {
                () = sleep(pause) => {}
                () = pause_rx.triggered() => {}
            }
        }
    }
    overall.duration = started.elapsed();

    let rendered = render_ramp(plan, &overall, &finished, print_phases)?;
    report::emit(&rendered, plan.out_file.as_deref()).await
}

async fn run_phase(
    plan: &RampPlan,
    phase: &Phase,
    shutdown_rx: &ShutdownReceiver,
) -> AppResult<RunReport> {
    let (phase_tx, phase_rx) = shutdown_channel();
    let forward = forward_shutdown(shutdown_rx, &phase_tx);
    let deadline = setup_deadline_shutdown(&phase_tx, plan.timeout);

    let report = match (plan.budget, phase.rate) {
        (PhaseBudget::Requests(total), _) => {
            run_count(&phase_rx, &plan.url, &plan.spec, total, phase.concurrency).await
        }
        (PhaseBudget::Duration(duration), Some(rate)) => {
            run_duration_at_rate(
                &phase_rx,
                &plan.url,
                &plan.spec,
                duration,
                phase.concurrency,
                rate,
            )
            .await
        }
        (PhaseBudget::Duration(duration), None) => {
            run_duration(&phase_rx, &plan.url, &plan.spec, duration, phase.concurrency).await
        }
    };
    forward.abort();
    deadline.abort();

    if phase_rx.is_triggered() && !shutdown_rx.is_triggered() {
        warn!(
            "Phase {} stopped at its {:?} timeout",
            phase.number, plan.timeout
        );
    }
    report
}

/// Text output skips the phase lines already printed to stdout.
fn render_ramp(
    plan: &RampPlan,
    overall: &RunReport,
    finished: &[(Phase, RunReport)],
    phases_printed: bool,
) -> AppResult<String> {
    match plan.format {
        OutputFormat::Text => {
            let mut rendered = String::new();
            if !phases_printed {
                for (phase, report) in finished {
                    rendered.push_str(&report::render_phase_line(phase.number, report));
                    rendered.push('\n');
                }
            }
            rendered.push_str(&report::render_ramp_text(overall));
            Ok(rendered)
        }
        OutputFormat::Json => report::render_json(&RampSummaryJson {
            url: plan.url.to_string(),
            method: plan.spec.method().as_str().to_owned(),
            steps: plan.steps,
            start_concurrency: plan.start_concurrency,
            step_concurrency: plan.step_concurrency,
            mode: plan.mode().to_owned(),
            per_step: plan.per_step(),
            stats: StatsJson::from(overall),
            timestamp: report::timestamp_now(),
            phases: finished
                .iter()
                .map(|(phase, report)| PhaseJson {
                    phase: phase.number,
                    concurrency: phase.concurrency,
                    rate: phase.rate,
                    stats: StatsJson::from(report),
                })
                .collect(),
        }),
    }
}
