//! Per-service token-bucket rate limiting.
//!
//! One bucket is shared by every concurrent task touching a service; the
//! orchestrator rebuilds the buckets at the start of each run.

use cs_error::ApiError;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// A token bucket throttle.
///
/// Acquisition suspends the calling task until a token is available or the
/// deadline elapses; it never busy-spins. Interior state is a small mutex
/// held only while computing the refill, never across an await.
#[derive(Debug)]
pub struct TokenBucket {
    /// Tokens added per second
    rate: f64,

    /// Maximum tokens the bucket can hold
    burst: f64,

    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket refilled at `rate_per_sec`, holding at most `burst`
    /// tokens (defaults to the rate rounded up). The bucket starts full.
    pub fn new(rate_per_sec: f64, burst: Option<usize>) -> Self {
        let burst = burst
            .map(|b| b as f64)
            .unwrap_or_else(|| rate_per_sec.ceil().max(1.0));
        Self {
            rate: rate_per_sec,
            burst,
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Acquire one token, waiting cooperatively until one is available.
    ///
    /// Fails with [`ApiError::Timeout`] when the wait would run past
    /// `deadline`.
    pub async fn acquire(&self, deadline: Instant) -> Result<(), ApiError> {
        loop {
            let wait = {
                let mut state = self.state.lock();
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return Ok(());
                }

                Duration::from_secs_f64((1.0 - state.tokens) / self.rate)
            };

            if Instant::now() + wait > deadline {
                return Err(ApiError::Timeout(
                    "deadline elapsed while waiting for rate limit token".to_string(),
                ));
            }

            sleep(wait).await;
        }
    }

    /// Tokens currently available, after refill. Monitoring only.
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
        state.last_refill = now;
        state.tokens
    }
}
