mod app;
mod config;
mod control;
mod http;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use control::ControlError;
pub use http::HttpError;
pub use validation::ValidationError;
