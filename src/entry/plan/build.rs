use clap::ArgMatches;

use crate::args::ControlArgs;
use crate::control::{DEFAULT_HEAD_TIMEOUT, Liveness, ServerSettings};
use crate::error::{AppError, AppResult, ValidationError};

use super::types::ServePlan;

pub(in crate::entry) fn build_plan(mut args: ControlArgs, matches: &ArgMatches) -> AppResult<ServePlan> {
    if let Some(config) = crate::config::load_config(args.config.as_deref())? {
        crate::config::apply_config(&mut args, matches, &config)?;
    }

    // A controller that answers every ping must never look idle.
    if args.idle_timeout <= args.heartbeat_interval {
        return Err(AppError::validation(
            ValidationError::IdleTimeoutTooShort {
                idle: args.idle_timeout,
                heartbeat: args.heartbeat_interval,
            },
        ));
    }

    Ok(ServePlan {
        listen: args.listen,
        settings: ServerSettings {
            public_dir: args.public_dir,
            status_interval: args.status_interval,
            liveness: Liveness {
                heartbeat_interval: args.heartbeat_interval,
                idle_timeout: args.idle_timeout,
            },
            head_timeout: DEFAULT_HEAD_TIMEOUT,
        },
        target: args.url,
        request_timeout: args.request_timeout,
        drain_timeout: args.drain_timeout,
        max_concurrency: args.max_concurrency,
        verbose: args.verbose,
        no_color: args.no_color,
    })
}
