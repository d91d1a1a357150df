use super::{
    apply_config, load_config_file,
    types::{ConfigFile, DurationValue},
};
use clap::{CommandFactory, FromArgMatches};
use std::time::Duration;
use tempfile::tempdir;

use crate::args::ControlArgs;
use crate::error::{AppError, ConfigError};

fn parse_with_matches(argv: &[&str]) -> Result<(ControlArgs, clap::ArgMatches), String> {
    let matches = ControlArgs::command()
        .try_get_matches_from(argv)
        .map_err(|err| format!("parse failed: {}", err))?;
    let args = ControlArgs::from_arg_matches(&matches)
        .map_err(|err| format!("from_arg_matches failed: {}", err))?;
    Ok((args, matches))
}

#[test]
fn parse_toml_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("surge.toml");
    let content = r#"
listen = "127.0.0.1:9090"
url = "http://localhost:3000/"
timeout = "500ms"
drain_timeout = 30
max_concurrency = 256
"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    if config.listen.as_deref() != Some("127.0.0.1:9090") {
        return Err("Unexpected listen".to_owned());
    }
    if config.timeout != Some(DurationValue::Text("500ms".to_owned())) {
        return Err(format!("Unexpected timeout: {:?}", config.timeout));
    }
    if config.drain_timeout != Some(DurationValue::Seconds(30)) {
        return Err(format!("Unexpected drain_timeout: {:?}", config.drain_timeout));
    }
    if config.max_concurrency != Some(256) {
        return Err("Unexpected max_concurrency".to_owned());
    }
    Ok(())
}

#[test]
fn parse_json_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("surge.json");
    let content = r#"{ "public_dir": "/srv/dashboard", "status_interval": "2s", "verbose": true }"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    if config.public_dir.as_deref() != Some("/srv/dashboard") {
        return Err("Unexpected public_dir".to_owned());
    }
    if config.verbose != Some(true) {
        return Err("Expected verbose".to_owned());
    }
    Ok(())
}

#[test]
fn unsupported_extension_is_rejected() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("surge.yaml");
    std::fs::write(&path, "url: x").map_err(|err| format!("write failed: {}", err))?;

    match load_config_file(&path) {
        Err(AppError::Config(ConfigError::UnsupportedExtension { ext })) if ext == "yaml" => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected yaml config to fail".to_owned()),
    }
}

#[test]
fn config_fills_values_not_set_on_cli() -> Result<(), String> {
    let (mut args, matches) =
        parse_with_matches(&["surge", "--timeout", "3s", "--idle-timeout", "20s"])?;
    let config = ConfigFile {
        url: Some("https://example.com/ping".to_owned()),
        timeout: Some(DurationValue::Text("9s".to_owned())),
        drain_timeout: Some(DurationValue::Seconds(4)),
        max_concurrency: Some(50),
        status_interval: Some(DurationValue::Text("750ms".to_owned())),
        heartbeat_interval: Some(DurationValue::Seconds(5)),
        idle_timeout: Some(DurationValue::Seconds(90)),
        ..ConfigFile::default()
    };

    apply_config(&mut args, &matches, &config).map_err(|err| err.to_string())?;

    if args.url.as_str() != "https://example.com/ping" {
        return Err(format!("Unexpected url: {}", args.url));
    }
    if args.request_timeout != Duration::from_secs(3) {
        return Err("CLI timeout should win over config".to_owned());
    }
    if args.drain_timeout != Duration::from_secs(4) {
        return Err("Unexpected drain_timeout".to_owned());
    }
    if args.max_concurrency != 50 {
        return Err("Unexpected max_concurrency".to_owned());
    }
    if args.status_interval != Some(Duration::from_millis(750)) {
        return Err("Unexpected status_interval".to_owned());
    }
    if args.heartbeat_interval != Duration::from_secs(5) {
        return Err("Unexpected heartbeat_interval".to_owned());
    }
    if args.idle_timeout != Duration::from_secs(20) {
        return Err("CLI idle timeout should win over config".to_owned());
    }
    Ok(())
}

#[test]
fn invalid_config_values_are_rejected() -> Result<(), String> {
    let (mut args, matches) = parse_with_matches(&["surge"])?;

    let zero_duration = ConfigFile {
        drain_timeout: Some(DurationValue::Seconds(0)),
        ..ConfigFile::default()
    };
    match apply_config(&mut args, &matches, &zero_duration) {
        Err(AppError::Config(ConfigError::InvalidDuration { field, .. }))
            if field == "drain_timeout" => {}
        Err(err) => return Err(format!("Unexpected error: {}", err)),
        Ok(()) => return Err("Expected zero drain_timeout to fail".to_owned()),
    }

    let bad_listen = ConfigFile {
        listen: Some("not-an-address".to_owned()),
        ..ConfigFile::default()
    };
    if apply_config(&mut args, &matches, &bad_listen).is_ok() {
        return Err("Expected invalid listen address to fail".to_owned());
    }

    let zero_max = ConfigFile {
        max_concurrency: Some(0),
        ..ConfigFile::default()
    };
    if apply_config(&mut args, &matches, &zero_max).is_ok() {
        return Err("Expected zero max_concurrency to fail".to_owned());
    }
    Ok(())
}
