pub(crate) const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
pub(crate) const DEFAULT_PUBLIC_DIR: &str = "./public";
pub(crate) const DEFAULT_TARGET_URL: &str = "http://localhost/";
pub(crate) const DEFAULT_REQUEST_TIMEOUT: &str = "10s";
pub(crate) const DEFAULT_DRAIN_TIMEOUT: &str = "10s";
/// Upper bound on a single pool's capacity accepted from a controller.
pub(crate) const DEFAULT_MAX_CONCURRENCY: &str = "10000";
pub(crate) const DEFAULT_HEARTBEAT_INTERVAL: &str = "15s";
/// A controller that sends nothing (not even a pong) for this long is dropped.
pub(crate) const DEFAULT_IDLE_TIMEOUT: &str = "45s";
