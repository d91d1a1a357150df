use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::defaults::{
    DEFAULT_DRAIN_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_IDLE_TIMEOUT, DEFAULT_LISTEN,
    DEFAULT_MAX_CONCURRENCY, DEFAULT_PUBLIC_DIR, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TARGET_URL,
};
use super::parsers::{parse_bool_env, parse_duration_arg, parse_positive_u32, parse_target_url};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Remotely controlled async HTTP load generator - start, stop and resize a worker pool live from a WebSocket dashboard."
)]
pub struct ControlArgs {
    /// Address for the dashboard and the /ws control socket
    #[arg(long, short = 'l', default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Directory of static dashboard assets
    #[arg(long = "public-dir", default_value = DEFAULT_PUBLIC_DIR)]
    pub public_dir: PathBuf,

    /// Target URL every worker requests
    #[arg(long, short, default_value = DEFAULT_TARGET_URL, value_parser = parse_target_url)]
    pub url: Url,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", default_value = DEFAULT_REQUEST_TIMEOUT, value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// How long shutdown waits for in-flight requests (supports ms/s/m/h)
    #[arg(long = "drain-timeout", default_value = DEFAULT_DRAIN_TIMEOUT, value_parser = parse_duration_arg)]
    pub drain_timeout: Duration,

    /// Largest concurrency a controller may request; larger start/update requests are
    /// rejected and the reply carries an error
    #[arg(long = "max-concurrency", default_value = DEFAULT_MAX_CONCURRENCY, value_parser = parse_positive_u32)]
    pub max_concurrency: u32,

    /// Also push the run state to the controller at this interval
    #[arg(long = "status-interval", value_parser = parse_duration_arg)]
    pub status_interval: Option<Duration>,

    /// How often the control session pings the controller (supports ms/s/m/h)
    #[arg(long = "heartbeat-interval", default_value = DEFAULT_HEARTBEAT_INTERVAL, value_parser = parse_duration_arg)]
    pub heartbeat_interval: Duration,

    /// Close a control session after this long without any frame from the controller
    #[arg(long = "idle-timeout", default_value = DEFAULT_IDLE_TIMEOUT, value_parser = parse_duration_arg)]
    pub idle_timeout: Duration,

    /// Enable verbose logging (sets log level to debug unless overridden by SURGE_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,

    /// Path to config file (TOML/JSON). Defaults to ./surge.toml or ./surge.json if present.
    #[arg(long)]
    pub config: Option<String>,
}
