mod plan;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use crate::args::ControlArgs;
use crate::error::AppResult;
use plan::{build_plan, execute_plan};

/// Parses arguments, merges the config file, and serves until shutdown.
///
/// # Errors
///
/// Returns an error for invalid arguments or configuration, when the
/// listener cannot be bound, or when the runtime cannot be started.
pub fn run() -> AppResult<()> {
    let (args, matches) = parse_args()?;
    let plan = build_plan(args, &matches)?;

    crate::system::logger::init_logging(plan.verbose, plan.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(execute_plan(plan))
}

fn parse_args() -> AppResult<(ControlArgs, ArgMatches)> {
    let matches = ControlArgs::command().get_matches();
    let args = ControlArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}
