//! Rate-limited, retrying completion client.
//!
//! Every external call in the process goes through a [`RateLimitedClient`]
//! sharing one [`RateLimiter`]. Each attempt claims a limiter slot, is
//! bounded by a timeout, and is retried after a backoff when the endpoint
//! reports a rate-limit rejection. Any other failure is returned as is.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::RateLimitConfig;
use crate::limiter::RateLimiter;
use crate::progress::{ProgressTracker, TaskStatus};
use crate::providers::{CompletionProvider, CompletionRequest, ProviderError};

/// Errors from a rate-limited call.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("request timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    #[error("gave up after {attempts} rate-limited attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: ProviderError },
}

/// Retry behaviour for rate-limit rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum retries after the first attempt; `None` retries forever.
    pub max_retries: Option<u32>,
    /// Wait before re-issuing a rejected request.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Retry forever, waiting one full window between attempts.
    pub fn unbounded(window: Duration) -> Self {
        Self {
            max_retries: None,
            backoff: window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: config.window(),
        }
    }

    fn allows(&self, retries_so_far: u32) -> bool {
        self.max_retries.is_none_or(|max| retries_so_far < max)
    }
}

/// Completion client enforcing the shared call rate.
pub struct RateLimitedClient {
    provider: Arc<dyn CompletionProvider>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    timeout: Duration,
    progress: Option<Arc<ProgressTracker>>,
    retries: AtomicU64,
}

impl RateLimitedClient {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            limiter,
            policy,
            timeout,
            progress: None,
            retries: AtomicU64::new(0),
        }
    }

    /// Report retries for labelled tasks through `progress`.
    pub fn with_progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Total rate-limit retries performed by this client.
    pub fn retries_observed(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Send `request`, waiting for the limiter and retrying rejections.
    ///
    /// `task` labels progress updates (e.g. "Analyzing batch 2 of 5").
    pub async fn send(&self, task: &str, request: &CompletionRequest) -> Result<String, ClientError> {
        let mut retries: u32 = 0;

        loop {
            let waited = self.limiter.acquire().await;
            if !waited.is_zero() {
                tracing::debug!(task, waited_secs = waited.as_secs(), "rate window elapsed");
            }

            let outcome = tokio::time::timeout(self.timeout, self.provider.complete(request)).await;
            match outcome {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(err)) if err.is_rate_limited() => {
                    if !self.policy.allows(retries) {
                        return Err(ClientError::RetriesExhausted {
                            attempts: retries + 1,
                            last: err,
                        });
                    }
                    retries += 1;
                    self.retries.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        task,
                        retry = retries,
                        backoff_secs = self.policy.backoff.as_secs(),
                        error = %err,
                        "endpoint rate limited the request, retrying"
                    );
                    self.report(
                        task,
                        TaskStatus::Retrying {
                            attempt: retries,
                            reason: "Rate limited by API".to_string(),
                            backoff_secs: self.policy.backoff.as_secs(),
                        },
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                    self.report(task, TaskStatus::InProgress);
                }
                Ok(Err(err)) => return Err(err.into()),
                Err(_) => {
                    return Err(ClientError::Timeout {
                        after: self.timeout,
                    });
                }
            }
        }
    }

    fn report(&self, task: &str, status: TaskStatus) {
        if let Some(progress) = &self.progress {
            progress.update(task, status);
        }
    }
}
