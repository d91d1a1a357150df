//! Units of work executed by the worker pool.
mod http;
#[cfg(test)]
pub(crate) mod test_support;

use async_trait::async_trait;

pub use http::HttpWork;

/// One repeatable unit of external work.
///
/// Implementations report failures themselves (by logging); the pool treats
/// every call as fire-and-forget.
#[async_trait]
pub trait Work: Send + Sync + 'static {
    async fn run(&self, id: u64);
}
