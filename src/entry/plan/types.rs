use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

use crate::control::ServerSettings;

/// Fully resolved settings for one process lifetime.
pub(in crate::entry) struct ServePlan {
    pub(super) listen: SocketAddr,
    pub(super) settings: ServerSettings,
    pub(super) target: Url,
    pub(super) request_timeout: Duration,
    pub(super) drain_timeout: Duration,
    pub(super) max_concurrency: u32,
    pub(in crate::entry) verbose: bool,
    pub(in crate::entry) no_color: bool,
}
