use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use super::defaults::{
    DEFAULT_CONCURRENCY, DEFAULT_RAMP_START_CONCURRENCY, DEFAULT_RAMP_STEP_CONCURRENCY,
    DEFAULT_RAMP_STEPS, DEFAULT_TIMEOUT,
};
use super::parsers::{parse_duration_arg, parse_header};
use super::types::{DocsFormat, HeaderPair, HttpMethod, OutputFormat};

const ROOT_LONG_ABOUT: &str = "stress-test is a simple, fast CLI for HTTP load testing.

Use the subcommands to run different kinds of tests:
  run     Fire a fixed number of requests with a given concurrency
  ramp    Execute multiple phases ramping concurrency (by requests, duration, or target RPS)
  curl    Send a single HTTP request using a small subset of curl flags
  version Print build information (version, commit, date)
  docs    Generate CLI documentation

Append --help to any subcommand to see its specific flags.";

const ROOT_AFTER_HELP: &str = "Examples:
  stress-test run --url https://example.com --requests 100 --concurrency 10
  stress-test ramp --url https://example.com --steps 3 --start-concurrency 5 \\
    --step-concurrency 5 --per-step-duration 10s --rps 50 --step-rps 10
  stress-test curl -i https://httpbin.org/get
  stress-test version";

#[derive(Debug, Parser, Clone)]
#[command(
    name = "stress-test",
    version,
    about = "CLI to run load/stress tests",
    long_about = ROOT_LONG_ABOUT,
    after_help = ROOT_AFTER_HELP
)]
pub struct Cli {
    /// Verbose mode (debug logs to stderr)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Path to a config file (.toml or .json); defaults to ./stress-test.toml or ./stress-test.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a load test against a target URL
    #[command(
        long_about = "Run a fixed number of HTTP requests with a given concurrency.\n\nKey metrics: total time, total requests, requests/sec (RPS), 200 OK count, per-status counts and error count.",
        after_help = "Examples:\n  stress-test run --url https://example.com --requests 100 --concurrency 10\n  stress-test run --url https://httpbin.org/post --requests 50 --method POST \\\n    --header 'Content-Type: application/json' --body '{\"a\":1}'\n  stress-test run --url https://example.com --requests 200 --output json --out-file result.json"
    )]
    Run(RunArgs),

    /// Run multiple phases with increasing concurrency
    #[command(
        long_about = "Run a multi-phase test ramping concurrency between phases.\n\nModes per phase:\n  A) Requests mode:   --requests-per-step > 0\n  B) Duration mode:   --per-step-duration > 0 (max throughput per concurrency)\n  C) Duration + rate: --per-step-duration > 0 and --rps > 0 (paced RPS target)\n\nPer-phase concurrency is start + i*step for i in [0..steps-1].",
        after_help = "Examples:\n  stress-test ramp --url https://example.com --steps 3 --start-concurrency 5 \\\n    --step-concurrency 5 --requests-per-step 200\n  stress-test ramp --url https://example.com --steps 2 --start-concurrency 10 \\\n    --step-concurrency 10 --per-step-duration 15s\n  stress-test ramp --url https://example.com --steps 3 --start-concurrency 20 \\\n    --step-concurrency 0 --per-step-duration 20s --rps 50 --step-rps 25 --output json"
    )]
    Ramp(RampArgs),

    /// Execute a curl-style request and print the response
    #[command(
        disable_help_flag = true,
        long_about = "Execute a single HTTP request using a small subset of curl flags.\n\nSupported flags:\n  -X, --request METHOD        Set HTTP method\n  -H, --header 'K: V'         Add header (repeatable)\n  -d, --data [--data-raw...]  Request body (switches to POST if method not set)\n  -A, --user-agent UA         Set the User-Agent header\n  -i                          Include response status line and headers\n  -I, --head                  Use HEAD method\n  --url URL                   Explicit URL (or pass the URL as a bare argument)\n  --stats                     Print time, status and body size to stderr\n\nOnly the response body is written to stdout.",
        after_help = "Examples:\n  stress-test curl -i https://httpbin.org/get\n  stress-test curl -X POST https://httpbin.org/post -H 'Content-Type: application/json' \\\n    -d '{\"hello\":\"world\"}' --stats"
    )]
    Curl(CurlArgs),

    /// Show CLI version
    Version,

    /// Generate CLI documentation (markdown or man)
    Docs(DocsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Target URL to test
    #[arg(long)]
    pub url: Option<String>,

    /// Total number of requests
    #[arg(long)]
    pub requests: Option<u64>,

    /// Number of concurrent workers
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Overall test timeout (e.g. 30s, 1m30s, 1.5s)
    #[arg(long, default_value = DEFAULT_TIMEOUT, value_parser = parse_duration_arg)]
    pub timeout: Duration,

    #[command(flatten)]
    pub request: RequestArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RampArgs {
    /// Target URL to test
    #[arg(long)]
    pub url: Option<String>,

    /// Number of ramp phases
    #[arg(long, default_value_t = DEFAULT_RAMP_STEPS)]
    pub steps: u64,

    /// Concurrency at the first phase
    #[arg(long = "start-concurrency", default_value_t = DEFAULT_RAMP_START_CONCURRENCY)]
    pub start_concurrency: usize,

    /// Concurrency increment per phase
    #[arg(long = "step-concurrency", default_value_t = DEFAULT_RAMP_STEP_CONCURRENCY)]
    pub step_concurrency: usize,

    /// Total requests per phase [default: 100 unless --per-step-duration is set]
    #[arg(long = "requests-per-step")]
    pub requests_per_step: Option<u64>,

    /// Per-phase duration, alternative to --requests-per-step (e.g. 30s, 1m30s, 1.5s)
    #[arg(long = "per-step-duration", value_parser = parse_duration_arg)]
    pub per_step_duration: Option<Duration>,

    /// Sleep between phases (e.g. 30s, 1m30s, 1.5s)
    #[arg(long = "sleep-between", value_parser = parse_duration_arg)]
    pub sleep_between: Option<Duration>,

    /// Per-phase timeout (e.g. 30s, 1m30s, 1.5s)
    #[arg(long, default_value = DEFAULT_TIMEOUT, value_parser = parse_duration_arg)]
    pub timeout: Duration,

    /// Target requests per second for the first phase (requires --per-step-duration)
    #[arg(long, default_value_t = 0.0)]
    pub rps: f64,

    /// RPS increment per phase
    #[arg(long = "step-rps", default_value_t = 0.0)]
    pub step_rps: f64,

    #[command(flatten)]
    pub request: RequestArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Request shape shared by `run` and `ramp`.
#[derive(Debug, Args, Clone)]
pub struct RequestArgs {
    /// HTTP method
    #[arg(long, default_value = "get", ignore_case = true)]
    pub method: HttpMethod,

    /// HTTP header in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<HeaderPair>,

    /// HTTP request body (string)
    #[arg(long, default_value = "")]
    pub body: String,
}

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Output format
    #[arg(long = "output", default_value = "text", ignore_case = true)]
    pub format: OutputFormat,

    /// Write the rendered output to this file instead of stdout
    #[arg(long = "out-file")]
    pub out_file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CurlArgs {
    /// curl arguments (run `stress-test curl --help` for the supported subset)
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..,
        value_name = "CURL_ARGS"
    )]
    pub args: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct DocsArgs {
    /// Output format
    #[arg(long, default_value = "markdown", ignore_case = true)]
    pub format: DocsFormat,

    /// Directory to write files to [default: docs/cli or docs/man]
    #[arg(long = "out-dir")]
    pub out_dir: Option<PathBuf>,
}
