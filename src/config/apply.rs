use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{
    HttpMethod, OutputArgs, OutputFormat, RampArgs, RequestArgs, RunArgs, parse_header,
};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

/// Fills `run` arguments the command line left at their defaults.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_run_config(
    args: &mut RunArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "requests")
        && let Some(requests) = config.requests
    {
        args.requests = Some(requests);
    }

    if !is_cli(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = concurrency;
    }

    if !is_cli(matches, "timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.timeout = timeout.to_duration("timeout")?;
    }

    apply_request_config(&mut args.request, matches, config)?;
    apply_output_config(&mut args.output, matches, config)
}

/// Fills `ramp` arguments from the top-level keys and the `[ramp]` table.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_ramp_config(
    args: &mut RampArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    apply_request_config(&mut args.request, matches, config)?;
    apply_output_config(&mut args.output, matches, config)?;

    let ramp = config.ramp.as_ref();
    if !is_cli(matches, "timeout")
        && let Some(timeout) = ramp
            .and_then(|ramp| ramp.timeout.as_ref())
            .or(config.timeout.as_ref())
    {
        args.timeout = timeout.to_duration("timeout")?;
    }

    let Some(ramp) = ramp else {
        return Ok(());
    };

    if !is_cli(matches, "steps")
        && let Some(steps) = ramp.steps
    {
        args.steps = steps;
    }
    if !is_cli(matches, "start_concurrency")
        && let Some(start) = ramp.start_concurrency
    {
        args.start_concurrency = start;
    }
    if !is_cli(matches, "step_concurrency")
        && let Some(step) = ramp.step_concurrency
    {
        args.step_concurrency = step;
    }
    if !is_cli(matches, "requests_per_step")
        && let Some(requests) = ramp.requests_per_step
    {
        args.requests_per_step = Some(requests);
    }
    if !is_cli(matches, "per_step_duration")
        && let Some(duration) = ramp.per_step_duration.as_ref()
    {
        args.per_step_duration = Some(duration.to_duration("ramp.per_step_duration")?);
    }
    if !is_cli(matches, "sleep_between")
        && let Some(sleep) = ramp.sleep_between.as_ref()
    {
        args.sleep_between = Some(sleep.to_duration("ramp.sleep_between")?);
    }
    if !is_cli(matches, "rps")
        && let Some(rps) = ramp.rps
    {
        args.rps = rps;
    }
    if !is_cli(matches, "step_rps")
        && let Some(step_rps) = ramp.step_rps
    {
        args.step_rps = step_rps;
    }
    Ok(())
}

fn apply_request_config(
    request: &mut RequestArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "method")
        && let Some(method) = config.method.as_deref()
    {
        request.method = method.parse::<HttpMethod>().map_err(|_err| {
            AppError::config(ConfigError::InvalidMethod {
                value: method.to_owned(),
            })
        })?;
    }

    if !is_cli(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        let mut parsed = Vec::with_capacity(headers.len());
        for header in headers {
            parsed.push(
                parse_header(header)
                    .map_err(|err| AppError::config(ConfigError::InvalidHeader { source: err }))?,
            );
        }
        request.headers = parsed;
    }

    if !is_cli(matches, "body")
        && let Some(body) = config.body.clone()
    {
        request.body = body;
    }
    Ok(())
}

fn apply_output_config(
    output: &mut OutputArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "format")
        && let Some(format) = config.output.as_deref()
    {
        output.format = format.parse::<OutputFormat>()?;
    }

    if !is_cli(matches, "out_file")
        && let Some(out_file) = config.out_file.clone()
    {
        output.out_file = Some(out_file);
    }
    Ok(())
}
