use std::future::Future;

use hexmap_shared::{POLYGONS_PATH, PolygonRecord, ResourceInfo};
use thiserror::Error;

use crate::config::{API_BASE, FETCH_BASE_DELAY_MS, FETCH_MAX_ATTEMPTS, FETCH_MAX_DELAY_MS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("fetch error: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// Transport failures and 5xx are worth another attempt; 4xx and bad
    /// bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status(status) => *status >= 500,
            Self::Parse(_) => false,
        }
    }
}

/// Map a non-success HTTP status to an error.
pub fn check_status(status: u16) -> Result<(), FetchError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(FetchError::Status(status))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u32,
    pub max_delay_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: FETCH_MAX_ATTEMPTS,
            base_delay_ms: FETCH_BASE_DELAY_MS,
            max_delay_ms: FETCH_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    #[cfg(test)]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Delay after the given failed attempt (1-based): doubling, capped.
    pub fn delay_for(&self, attempt: u32) -> u32 {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }
}

/// Drive `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. `sleep` is handed each backoff delay in ms.
pub async fn with_retry<T, Op, Fut, Sleep, SleepFut>(
    policy: &RetryPolicy,
    mut sleep: Sleep,
    mut op: Op,
) -> Result<T, FetchError>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
    Sleep: FnMut(u32) -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::debug!(attempt, delay, error = %err, "retrying request");
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Read-only access to the resource info service.
pub trait ResourceInfoSource {
    fn fetch_info(&self, path: &str) -> impl Future<Output = Result<ResourceInfo, FetchError>>;

    fn fetch_polygons(&self) -> impl Future<Output = Result<Vec<PolygonRecord>, FetchError>>;
}

/// `gloo-net` backed client. Info requests retry per `policy`; the polygon
/// listing is diagnostic and gets a single attempt.
#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    base: String,
    policy: RetryPolicy,
}

impl Default for HttpResourceClient {
    fn default() -> Self {
        Self::new(API_BASE, RetryPolicy::default())
    }
}

impl HttpResourceClient {
    pub fn new(base: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            base: base.into(),
            policy,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.trim_end_matches('/'), path)
    }
}

async fn get_json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    check_status(resp.status())?;
    resp.json::<T>()
        .await
        .map_err(|e| FetchError::Parse(e.to_string()))
}

async fn sleep_ms(ms: u32) {
    gloo_timers::future::TimeoutFuture::new(ms).await;
}

impl ResourceInfoSource for HttpResourceClient {
    async fn fetch_info(&self, path: &str) -> Result<ResourceInfo, FetchError> {
        let url = self.url(path);
        with_retry(&self.policy, sleep_ms, |_| get_json::<ResourceInfo>(&url)).await
    }

    async fn fetch_polygons(&self) -> Result<Vec<PolygonRecord>, FetchError> {
        get_json(&self.url(POLYGONS_PATH)).await
    }
}
