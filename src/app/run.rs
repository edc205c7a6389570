use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::args::parsers::{ensure_positive_u64, ensure_positive_usize};
use crate::args::{HttpMethod, OutputFormat, RequestArgs, RunArgs, parse_target_url};
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::{RequestSpec, run_count};
use crate::metrics::RunReport;
use crate::report::{self, RunSummaryJson, StatsJson};
use crate::shutdown::ShutdownSender;
use crate::shutdown_handlers::setup_deadline_shutdown;

/// A validated `run` invocation.
#[derive(Debug)]
pub(crate) struct RunPlan {
    pub url: Url,
    pub spec: RequestSpec,
    pub requests: u64,
    pub concurrency: usize,
    pub timeout: Duration,
    pub format: OutputFormat,
    pub out_file: Option<PathBuf>,
}

impl RunPlan {
    pub(crate) fn from_args(args: &RunArgs) -> AppResult<Self> {
        let url = parse_target_url(args.url.as_deref().unwrap_or_default())?;
        let requests = ensure_positive_u64(args.requests.unwrap_or(0), "requests")?;
        let concurrency = ensure_positive_usize(args.concurrency, "concurrency")?;
        if args.timeout.is_zero() {
            return Err(AppError::validation(ValidationError::MustBePositive {
                flag: "timeout",
            }));
        }
        Ok(Self {
            url,
            spec: build_request_spec(&args.request)?,
            requests,
            concurrency,
            timeout: args.timeout,
            format: args.output.format,
            out_file: args.output.out_file.clone(),
        })
    }
}

pub(crate) fn build_request_spec(request: &RequestArgs) -> AppResult<RequestSpec> {
    Ok(RequestSpec::new(request.method)
        .with_headers(&request.headers)?
        .with_body(request.body.clone()))
}

/// Fires the planned requests and renders the report.
pub(crate) async fn run_load(plan: &RunPlan, shutdown_tx: &ShutdownSender) -> AppResult<()> {
    let shutdown_rx = shutdown_tx.subscribe();
    let deadline = setup_deadline_shutdown(shutdown_tx, plan.timeout);

    info!(
        "Running {} {} requests against {} with concurrency {}",
        plan.requests,
        plan.spec.method(),
        plan.url,
        plan.concurrency
    );
    let report = run_count(
        &shutdown_rx,
        &plan.url,
        &plan.spec,
        plan.requests,
        plan.concurrency,
    )
    .await;
    deadline.abort();
    let report = report?;

    if shutdown_rx.is_triggered() {
        warn!("Run stopped early; the report covers completed requests only");
    }

    let rendered = render_run(&plan.url, plan.spec.method(), &report, plan.format)?;
    report::emit(&rendered, plan.out_file.as_deref()).await
}

fn render_run(
    url: &Url,
    method: HttpMethod,
    report: &RunReport,
    format: OutputFormat,
) -> AppResult<String> {
    match format {
        OutputFormat::Text => Ok(report::render_run_text(report)),
        OutputFormat::Json => report::render_json(&RunSummaryJson {
            url: url.to_string(),
            method: method.as_str().to_owned(),
            stats: StatsJson::from(report),
            timestamp: report::timestamp_now(),
        }),
    }
}
