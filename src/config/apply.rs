use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::ControlArgs;
use crate::args::parsers::parse_target_url;
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments. Values given on the command
/// line win over the file.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(
    args: &mut ControlArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "listen")
        && let Some(listen) = config.listen.as_deref()
    {
        args.listen = listen.trim().parse().map_err(|err| {
            AppError::config(ConfigError::InvalidListen {
                value: listen.to_owned(),
                source: err,
            })
        })?;
    }

    if !is_cli(matches, "public_dir")
        && let Some(public_dir) = config.public_dir.as_deref()
    {
        args.public_dir = public_dir.into();
    }

    if !is_cli(matches, "url")
        && let Some(url) = config.url.as_deref()
    {
        args.url = parse_target_url(url)?;
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = timeout.to_duration("timeout")?;
    }

    if !is_cli(matches, "drain_timeout")
        && let Some(timeout) = config.drain_timeout.as_ref()
    {
        args.drain_timeout = timeout.to_duration("drain_timeout")?;
    }

    if !is_cli(matches, "max_concurrency")
        && let Some(max) = config.max_concurrency
    {
        if max == 0 {
            return Err(AppError::config(ConfigError::FieldMustBePositive {
                field: "max_concurrency",
            }));
        }
        args.max_concurrency = max;
    }

    if !is_cli(matches, "status_interval")
        && let Some(interval) = config.status_interval.as_ref()
    {
        args.status_interval = Some(interval.to_duration("status_interval")?);
    }

    if !is_cli(matches, "heartbeat_interval")
        && let Some(interval) = config.heartbeat_interval.as_ref()
    {
        args.heartbeat_interval = interval.to_duration("heartbeat_interval")?;
    }

    if !is_cli(matches, "idle_timeout")
        && let Some(timeout) = config.idle_timeout.as_ref()
    {
        args.idle_timeout = timeout.to_duration("idle_timeout")?;
    }

    if !is_cli(matches, "verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    if !is_cli(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}
