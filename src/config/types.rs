use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::parse_duration_arg;
use crate::error::{AppError, AppResult, ConfigError};

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub listen: Option<String>,
    pub public_dir: Option<String>,
    pub url: Option<String>,
    pub timeout: Option<DurationValue>,
    pub drain_timeout: Option<DurationValue>,
    pub max_concurrency: Option<u32>,
    pub status_interval: Option<DurationValue>,
    pub heartbeat_interval: Option<DurationValue>,
    pub idle_timeout: Option<DurationValue>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
}

/// Durations in config files are either bare seconds or text like "250ms".
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self, field: &'static str) -> AppResult<Duration> {
        let parsed = match self {
            DurationValue::Seconds(secs) => parse_duration_arg(&secs.to_string()),
            DurationValue::Text(text) => parse_duration_arg(text),
        };
        parsed.map_err(|err| match err {
            AppError::Validation(source) => {
                AppError::config(ConfigError::InvalidDuration { field, source })
            }
            other => other,
        })
    }
}
