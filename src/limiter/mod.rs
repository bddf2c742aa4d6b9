//! Fixed-window call limiter.
//!
//! Allows at most one external call per window across every component
//! that shares the limiter. Callers that arrive early are suspended
//! until the window has elapsed; they are never rejected.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Shared call limiter. Construct once and hand out via `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    /// Start instant of the most recent call. The lock is held across
    /// the wait so concurrent callers are admitted one at a time.
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_call: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait for the next slot and claim it.
    ///
    /// Returns how long the caller was suspended.
    pub async fn acquire(&self) -> Duration {
        let mut last_call = self.last_call.lock().await;
        let arrived = Instant::now();

        if let Some(previous) = *last_call {
            let ready_at = previous + self.window;
            if ready_at > arrived {
                tracing::debug!(
                    wait_ms = (ready_at - arrived).as_millis() as u64,
                    "rate limiter waiting for next window"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let now = Instant::now();
        *last_call = Some(now);
        now - arrived
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        assert_eq!(limiter.acquire().await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_calls_are_spaced_by_window() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let mut stamps = Vec::new();
        for _ in 0..4 {
            limiter.acquire().await;
            stamps.push(Instant::now());
        }
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(60));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_once_window_has_passed() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(limiter.acquire().await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialised() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(5)));
        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }
        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(5));
        }
    }
}
