use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Url};
use tokio::time::Instant;
use tracing::{debug, error};

use crate::error::{AppError, AppResult, HttpError};
use crate::state::RunState;

use super::Work;

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("surge-loadgen/", env!("CARGO_PKG_VERSION"));

/// Issues one GET against the target per call and counts completed requests.
pub struct HttpWork {
    client: Client,
    target: Url,
    state: Arc<RunState>,
}

impl HttpWork {
    /// Builds the shared client used by every worker.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(target: Url, request_timeout: Duration, state: Arc<RunState>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|err| AppError::http(HttpError::BuildClient { source: err }))?;
        Ok(Self {
            client,
            target,
            state,
        })
    }

    async fn execute(&self) -> Result<(u16, u64), HttpError> {
        let response = self
            .client
            .get(self.target.clone())
            .send()
            .await
            .map_err(|err| HttpError::Request { source: err })?;
        let status = response.status().as_u16();
        let mut stream = response.bytes_stream();
        let mut total_bytes: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| HttpError::ReadBody { source: err })?;
            let len = u64::try_from(chunk.len()).unwrap_or(u64::MAX);
            total_bytes = total_bytes.saturating_add(len);
        }
        Ok((status, total_bytes))
    }
}

#[async_trait]
impl Work for HttpWork {
    async fn run(&self, id: u64) {
        let started = Instant::now();
        match self.execute().await {
            Ok((status, bytes)) => {
                self.state.increment_request_count();
                debug!(
                    "Request {} -> {} ({} bytes in {:?})",
                    id,
                    status,
                    bytes,
                    started.elapsed()
                );
            }
            Err(err) => {
                error!("Request {} failed: {}", id, err);
            }
        }
    }
}
