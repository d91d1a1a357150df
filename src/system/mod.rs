pub(crate) mod banner;
pub mod logger;
pub mod shutdown_handlers;
