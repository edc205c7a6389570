use std::ffi::OsString;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::app::{self, RampPlan, RunPlan};
use crate::args::{Cli, Command, CurlArgs, DocsArgs};
use crate::config::{apply_ramp_config, apply_run_config, load_config};
use crate::error::AppResult;
use crate::shutdown::shutdown_channel;
use crate::shutdown_handlers::setup_signal_shutdown_handler;

enum CommandPlan {
    Run(RunPlan),
    Ramp(RampPlan),
    Curl(CurlArgs),
    Version,
    Docs(DocsArgs),
}

pub(crate) fn run() -> AppResult<()> {
    let (cli, matches) = parse_args(std::env::args_os())?;

    crate::logger::init_logging(cli.verbose);

    let plan = build_plan(cli, &matches)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(execute_plan(plan))
}

fn parse_args<I>(raw_args: I) -> AppResult<(Cli, ArgMatches)>
where
    I: IntoIterator<Item = OsString>,
{
    let matches = Cli::command().get_matches_from(raw_args);
    let cli = Cli::from_arg_matches(&matches)?;
    Ok((cli, matches))
}

/// Loads the config file for load-test commands, lets explicit flags win,
/// and validates the result.
fn build_plan(cli: Cli, matches: &ArgMatches) -> AppResult<CommandPlan> {
    let sub_matches = matches.subcommand().map(|(_, sub)| sub);
    match cli.command {
        Command::Run(mut args) => {
            let config = load_config(cli.config.as_deref())?;
            if let (Some(config), Some(sub_matches)) = (config.as_ref(), sub_matches) {
                apply_run_config(&mut args, sub_matches, config)?;
            }
            Ok(CommandPlan::Run(RunPlan::from_args(&args)?))
        }
        Command::Ramp(mut args) => {
            let config = load_config(cli.config.as_deref())?;
            if let (Some(config), Some(sub_matches)) = (config.as_ref(), sub_matches) {
                apply_ramp_config(&mut args, sub_matches, config)?;
            }
            Ok(CommandPlan::Ramp(RampPlan::from_args(&args)?))
        }
        Command::Curl(args) => Ok(CommandPlan::Curl(args)),
        Command::Version => Ok(CommandPlan::Version),
        Command::Docs(args) => Ok(CommandPlan::Docs(args)),
    }
}

async fn execute_plan(plan: CommandPlan) -> AppResult<()> {
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let result = match plan {
        CommandPlan::Run(plan) => app::run_load(&plan, &shutdown_tx).await,
        CommandPlan::Ramp(plan) => app::run_ramp(&plan, &shutdown_tx).await,
        CommandPlan::Curl(args) => app::run_curl(&args, &shutdown_tx.subscribe()).await,
        CommandPlan::Version => {
            app::run_version();
            Ok(())
        }
        CommandPlan::Docs(args) => app::run_docs(&args).await,
    };

    signal_handle.abort();
    result
}
